//! # Cross-Domain Replay
//!
//! A signature collected for one chain or contract is submitted to another
//! deployment. The domain separator binds both, so it must fail either at
//! the domain policy or at signature verification.

#[cfg(test)]
mod tests {
    use crate::fixtures::{ecdsa_request, service, service_with, withdraw};
    use authz_core::domain::ecdsa::test_helpers::generate_keypair;
    use authz_core::{
        address_from_pubkey, AuthError, AuthorizationApi, AuthorizationConfig, RawSignature,
        ReplayProtection,
    };

    #[test]
    fn test_other_chain_rejected_by_policy() {
        let service = service();
        let (sk, _) = generate_keypair();
        let mut foreign = service.config().domain.clone();
        foreign.chain_id = 1;

        let request = ecdsa_request(
            &sk,
            &foreign,
            withdraw([0x01; 20], 1, "x"),
            ReplayProtection::ContentAddressed,
        );
        assert!(matches!(
            service.authorize(&request),
            Err(AuthError::DomainMismatch(_))
        ));
    }

    #[test]
    fn test_signature_moved_to_other_contract_recovers_other_signer() {
        let (sk, vk) = generate_keypair();
        let signer = address_from_pubkey(&vk);

        let mut config = AuthorizationConfig::for_testing();
        config.allowed_contracts.push([0xD0; 20]);
        let service = service_with(config);

        let home = service.config().domain.clone();
        let mut other = home.clone();
        other.verifying_contract = [0xD0; 20];

        // Signed for the home contract, resubmitted claiming the other one.
        let mut request = ecdsa_request(
            &sk,
            &home,
            withdraw([0x01; 20], 1, "x"),
            ReplayProtection::ContentAddressed,
        );
        request.domain = other;
        if let RawSignature::Ecdsa {
            expected_signer, ..
        } = &mut request.signature
        {
            *expected_signer = Some(signer);
        }

        assert_eq!(service.authorize(&request), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_retired_version_and_foreign_app_rejected() {
        let service = service();
        let (sk, _) = generate_keypair();

        let mut retired = service.config().domain.clone();
        retired.version = "0-deprecated".into();
        let mut other_app = service.config().domain.clone();
        other_app.name = "SomeOtherApp".into();

        for domain in [retired, other_app] {
            let request = ecdsa_request(
                &sk,
                &domain,
                withdraw([0x01; 20], 1, "x"),
                ReplayProtection::Sequential { nonce: 0 },
            );
            assert!(matches!(
                service.authorize(&request),
                Err(AuthError::DomainMismatch(_))
            ));
        }
    }
}
