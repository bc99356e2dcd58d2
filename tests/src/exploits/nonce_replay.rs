//! # Nonce Replay
//!
//! Resubmitting a consumed authorization, or submitting a forged one to burn
//! a victim's nonce, must never move the counter.

#[cfg(test)]
mod tests {
    use crate::fixtures::{ecdsa_request, service, withdraw};
    use authz_core::domain::ecdsa::test_helpers::generate_keypair;
    use authz_core::{
        address_from_pubkey, AuthError, AuthorizationApi, RawSignature, ReplayProtection,
    };

    #[test]
    fn test_resubmission_rejected() {
        let service = service();
        let (sk, vk) = generate_keypair();
        let domain = service.config().domain.clone();
        let request = ecdsa_request(
            &sk,
            &domain,
            withdraw([0x20; 20], 1, "once"),
            ReplayProtection::Sequential { nonce: 0 },
        );

        service.authorize(&request).unwrap();
        for _ in 0..3 {
            assert!(matches!(
                service.authorize(&request),
                Err(AuthError::StaleOrReusedNonce { .. })
            ));
        }
        assert_eq!(service.nonce_of(&address_from_pubkey(&vk)).unwrap(), 1);
    }

    #[test]
    fn test_forged_signature_cannot_burn_nonce() {
        let service = service();
        let (victim, victim_vk) = generate_keypair();
        let (attacker, _) = generate_keypair();
        let victim_addr = address_from_pubkey(&victim_vk);
        let domain = service.config().domain.clone();

        // Attacker signs, claiming to be the victim.
        let mut forged = ecdsa_request(
            &attacker,
            &domain,
            withdraw([0x66; 20], 1, "burn"),
            ReplayProtection::Sequential { nonce: 0 },
        );
        if let RawSignature::Ecdsa {
            expected_signer, ..
        } = &mut forged.signature
        {
            *expected_signer = Some(victim_addr);
        }
        assert_eq!(service.authorize(&forged), Err(AuthError::InvalidSignature));
        assert_eq!(service.nonce_of(&victim_addr).unwrap(), 0);

        let honest = ecdsa_request(
            &victim,
            &domain,
            withdraw([0x20; 20], 1, "honest"),
            ReplayProtection::Sequential { nonce: 0 },
        );
        assert!(service.authorize(&honest).is_ok());
    }

    #[test]
    fn test_consume_twice_second_fails() {
        let service = service();
        let principal = [0x31; 20];
        assert!(service.consume_nonce(principal, 0).is_ok());
        assert!(matches!(
            service.consume_nonce(principal, 0),
            Err(AuthError::StaleOrReusedNonce { .. })
        ));
    }
}
