//! Fuzz target for ECDSA recovery.
//!
//! ## Running
//!
//! ```bash
//! cd crates/authz-core
//! cargo +nightly fuzz run fuzz_ecdsa_recover
//! ```

#![no_main]

use authz_core::domain::ecdsa::{flip_v, invert_s, recover};
use authz_core::{AuthError, EcdsaSignature};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, arbitrary::Arbitrary)]
struct FuzzInput {
    digest: [u8; 32],
    r: [u8; 32],
    s: [u8; 32],
    v: u8,
}

fuzz_target!(|input: FuzzInput| {
    let signature = EcdsaSignature {
        r: input.r,
        s: input.s,
        v: input.v,
    };

    // Never panics, never yields the zero address.
    let result = recover(&input.digest, &signature);
    if let Ok(address) = result {
        assert_ne!(address, [0u8; 20]);
    }
    assert_eq!(result, recover(&input.digest, &signature));

    // At most one of a signature and its malleable twin is accepted.
    if result.is_ok() {
        let twin = EcdsaSignature {
            r: input.r,
            s: invert_s(&input.s),
            v: flip_v(input.v),
        };
        assert_eq!(
            recover(&input.digest, &twin),
            Err(AuthError::MalleableSignature)
        );
    }
});
