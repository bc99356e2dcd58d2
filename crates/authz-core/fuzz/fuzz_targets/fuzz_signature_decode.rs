//! Fuzz target for raw signature decoding.
//!
//! Arbitrary bytes for every scheme must either decode or fail with
//! `MalformedInput`.

#![no_main]

use authz_core::{
    typed_data_digest, AuthError, DomainSeparator, RawSignature, SignatureRecord, StructHash,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, arbitrary::Arbitrary)]
struct FuzzInput {
    scheme: u8,
    signer: [u8; 20],
    bytes: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    let digest = typed_data_digest(
        &DomainSeparator::new("Fuzz", "1", 1, [1u8; 20]),
        &StructHash::from_bytes([0u8; 32]),
    );
    let raw = match input.scheme % 3 {
        0 => RawSignature::Ecdsa {
            bytes: input.bytes,
            expected_signer: Some(input.signer),
        },
        1 => RawSignature::Frost {
            group: [0u8; 32],
            bytes: input.bytes,
        },
        _ => RawSignature::Lamport {
            account: input.signer,
            bytes: input.bytes,
        },
    };

    match SignatureRecord::decode(&raw, digest) {
        Ok(record) => assert_eq!(record.scheme(), raw.scheme()),
        Err(e) => assert!(matches!(e, AuthError::MalformedInput(_))),
    }
});
