//! # Concatenation Collision
//!
//! `abi.encodePacked("a", "bc") == abi.encodePacked("ab", "c")`. A signature
//! over one must not authorize the other.

#[cfg(test)]
mod tests {
    use crate::fixtures::{ecdsa_request, service};
    use authz_core::domain::ecdsa::test_helpers::generate_keypair;
    use authz_core::{
        typed_data_digest, AuthError, AuthorizationApi, ReplayProtection, StructEncoder,
        StructHash,
    };

    fn grant(role: &str, target: &str) -> StructHash {
        StructEncoder::new("Grant(string role,string target)")
            .push_string(role)
            .push_string(target)
            .finish()
    }

    #[test]
    fn test_split_point_is_bound() {
        let service = service();
        let domain = service.config().domain.clone();
        assert_ne!(
            typed_data_digest(&domain, &grant("a", "bc")),
            typed_data_digest(&domain, &grant("ab", "c"))
        );

        let (sk, _) = generate_keypair();
        let mut request = ecdsa_request(
            &sk,
            &domain,
            grant("admin", "vault"),
            ReplayProtection::ContentAddressed,
        );
        request.struct_hash = grant("adminv", "ault");

        // Recovers some unrelated key, so bind the expected signer.
        let honest = ecdsa_request(
            &sk,
            &domain,
            grant("admin", "vault"),
            ReplayProtection::ContentAddressed,
        );
        let signer = service.authorize(&honest).unwrap().principal;
        if let authz_core::RawSignature::Ecdsa {
            expected_signer, ..
        } = &mut request.signature
        {
            *expected_signer = Some(signer);
        }
        assert_eq!(service.authorize(&request), Err(AuthError::InvalidSignature));
    }
}
