//! # ECDSA Malleability
//!
//! Given a valid `(r, s, v)`, anyone can compute `(r, n - s, v')`, which
//! recovers the same key. Systems that key replay protection on signature
//! bytes accept both. The guard must accept at most one of the pair.

#[cfg(test)]
mod tests {
    use crate::fixtures::{ecdsa_request, service, withdraw};
    use authz_core::domain::ecdsa::test_helpers::{generate_keypair, malleable_twin, sign};
    use authz_core::domain::ecdsa::{flip_v, invert_s, recover};
    use authz_core::{
        keccak256, AuthError, AuthorizationApi, EcdsaSignature, RawSignature, ReplayProtection,
    };
    use proptest::prelude::*;

    #[test]
    fn test_twin_of_consumed_order_rejected() {
        let service = service();
        let (sk, _) = generate_keypair();
        let domain = service.config().domain.clone();
        let order = ecdsa_request(
            &sk,
            &domain,
            withdraw([0x10; 20], 500, "order-1"),
            ReplayProtection::ContentAddressed,
        );
        service.authorize(&order).unwrap();

        let RawSignature::Ecdsa { bytes, .. } = &order.signature else {
            unreachable!()
        };
        let twin = malleable_twin(&EcdsaSignature::from_bytes(bytes).unwrap());
        let mut replay = order.clone();
        replay.signature = RawSignature::Ecdsa {
            bytes: twin.to_bytes().to_vec(),
            expected_signer: None,
        };

        assert_eq!(
            service.authorize(&replay),
            Err(AuthError::MalleableSignature)
        );
    }

    #[test]
    fn test_half_order_boundary() {
        // s = n/2 is the largest accepted value; n/2 + 1 is the smallest rejected one.
        let half = hex_to_32("7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0");
        let mut above = half;
        above[31] += 1;
        let digest = keccak256(b"boundary");

        let at = recover(
            &digest,
            &EcdsaSignature {
                r: [0x01; 32],
                s: half,
                v: 27,
            },
        );
        assert_ne!(at, Err(AuthError::MalleableSignature));

        let over = recover(
            &digest,
            &EcdsaSignature {
                r: [0x01; 32],
                s: above,
                v: 27,
            },
        );
        assert_eq!(over, Err(AuthError::MalleableSignature));
    }

    fn hex_to_32(s: &str) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&hex::decode(s).unwrap());
        out
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_at_most_one_of_twins(msg in proptest::collection::vec(any::<u8>(), 0..64)) {
            let (sk, _) = generate_keypair();
            let digest = keccak256(&msg);
            let sig = sign(&digest, &sk);
            let twin = EcdsaSignature { r: sig.r, s: invert_s(&sig.s), v: flip_v(sig.v) };

            let accepted = [recover(&digest, &sig), recover(&digest, &twin)]
                .iter()
                .filter(|r| r.is_ok())
                .count();
            prop_assert_eq!(accepted, 1);
            prop_assert_eq!(recover(&digest, &twin), Err(AuthError::MalleableSignature));
        }
    }
}
