//! # Integration Test Flows
//!
//! Full authorization flows for every scheme:
//!
//! 1. **ECDSA**: sequential nonces across many calls by one signer
//! 2. **FROST**: provisioning a group key, threshold signing, replay
//! 3. **Lamport**: enroll, sign, rotate, sign again with the successor key
//! 4. **Concurrency**: racing callers on one principal

#[cfg(test)]
mod tests {
    use crate::fixtures::{ecdsa_request, service, withdraw};
    use authz_core::domain::ecdsa::test_helpers::generate_keypair;
    use authz_core::domain::frost::test_helpers::{
        public_key, random_scalar, split_secret, threshold_sign,
    };
    use authz_core::{
        address_from_pubkey, group_address, rotation_digest, typed_data_digest, AuthError,
        AuthorizationApi, AuthorizationRequest, LamportAccount, LamportKeyPair, RawSignature,
        ReplayProtection, SchemeTag, StateDelta,
    };
    use std::sync::Arc;

    // =========================================================================
    // ECDSA
    // =========================================================================

    #[test]
    fn test_ecdsa_sequential_calls() {
        let service = service();
        let (sk, vk) = generate_keypair();
        let signer = address_from_pubkey(&vk);
        let domain = service.config().domain.clone();

        for nonce in 0..5 {
            let request = ecdsa_request(
                &sk,
                &domain,
                withdraw([0xAB; 20], nonce * 10, "payout"),
                ReplayProtection::Sequential { nonce },
            );
            let auth = service.authorize(&request).unwrap();
            assert_eq!(auth.principal, signer);
        }
        assert_eq!(service.nonce_of(&signer).unwrap(), 5);

        // Skipping ahead is refused.
        let request = ecdsa_request(
            &sk,
            &domain,
            withdraw([0xAB; 20], 1, "payout"),
            ReplayProtection::Sequential { nonce: 7 },
        );
        assert_eq!(
            service.authorize(&request),
            Err(AuthError::StaleOrReusedNonce {
                expected: 5,
                supplied: 7
            })
        );
    }

    // =========================================================================
    // FROST
    // =========================================================================

    #[test]
    fn test_frost_threshold_authorization() {
        let service = service();
        let group = [0x3C; 32];
        let secret = random_scalar();
        let key = public_key(&secret);
        service.keys().register_group_key(group, key).unwrap();

        let domain = service.config().domain.clone();
        let struct_hash = withdraw([0x01; 20], 1_000, "bridge");
        let digest = typed_data_digest(&domain, &struct_hash);
        let shares = split_secret(&secret, 3, 5);
        let signers = [shares[0], shares[2], shares[4]];
        let sig = threshold_sign(&key, &signers, digest.as_bytes());

        let request = AuthorizationRequest {
            domain,
            struct_hash,
            signature: RawSignature::Frost {
                group,
                bytes: sig.to_bytes().to_vec(),
            },
            replay: ReplayProtection::ContentAddressed,
        };

        let auth = service.authorize(&request).unwrap();
        assert_eq!(auth.scheme, SchemeTag::Frost);
        assert_eq!(auth.principal, group_address(&key));
        assert_eq!(
            service.authorize(&request),
            Err(AuthError::DigestAlreadyConsumed)
        );
    }

    #[test]
    fn test_frost_two_shares_of_three_of_five_rejected() {
        let service = service();
        let group = [0x4D; 32];
        let secret = random_scalar();
        let key = public_key(&secret);
        service.keys().register_group_key(group, key).unwrap();

        let domain = service.config().domain.clone();
        let struct_hash = withdraw([0x01; 20], 5, "bridge");
        let digest = typed_data_digest(&domain, &struct_hash);
        let shares = split_secret(&secret, 3, 5);
        let sig = threshold_sign(&key, &shares[..2], digest.as_bytes());

        let request = AuthorizationRequest {
            domain,
            struct_hash,
            signature: RawSignature::Frost {
                group,
                bytes: sig.to_bytes().to_vec(),
            },
            replay: ReplayProtection::Sequential { nonce: 0 },
        };
        assert_eq!(service.authorize(&request), Err(AuthError::InvalidSignature));
        assert_eq!(service.nonce_of(&group_address(&key)).unwrap(), 0);
    }

    // =========================================================================
    // LAMPORT
    // =========================================================================

    fn lamport_call(
        service: &crate::fixtures::TestService,
        key: LamportKeyPair,
        account: [u8; 20],
        next_pkh: [u8; 32],
        counter: u64,
        memo: &str,
    ) -> AuthorizationRequest {
        let domain = service.config().domain.clone();
        let struct_hash = withdraw(account, counter, memo);
        let payload = typed_data_digest(&domain, &struct_hash);
        let digest = rotation_digest(&domain, &payload, &next_pkh, counter);
        AuthorizationRequest {
            domain,
            struct_hash,
            signature: RawSignature::Lamport {
                account,
                bytes: key.sign(&digest, next_pkh).to_bytes(),
            },
            replay: ReplayProtection::ContentAddressed,
        }
    }

    #[test]
    fn test_lamport_key_chain() {
        let service = service();
        let account = [0x5E; 20];
        let mut rng = rand::thread_rng();
        let keys: Vec<LamportKeyPair> = (0..4)
            .map(|_| LamportKeyPair::generate(&mut rng).unwrap())
            .collect();
        let pkhs: Vec<[u8; 32]> = keys.iter().map(|k| k.commitment()).collect();

        service.enroll_lamport(account, pkhs[0]).unwrap();

        let mut replays = Vec::new();
        for (counter, key) in keys.into_iter().take(3).enumerate() {
            let request = lamport_call(
                &service,
                key,
                account,
                pkhs[counter + 1],
                counter as u64,
                "rotate",
            );
            let auth = service.authorize(&request).unwrap();
            assert!(auth.deltas.contains(&StateDelta::CommitmentRotated {
                account,
                new_pkh: pkhs[counter + 1],
                counter: counter as u64 + 1,
            }));
            replays.push(request);
        }

        assert_eq!(
            service.lamport_state(&account).unwrap(),
            Some(LamportAccount {
                pkh: pkhs[3],
                counter: 3
            })
        );
        for request in &replays {
            assert_eq!(service.authorize(request), Err(AuthError::StaleCommitment));
        }
    }

    #[test]
    fn test_lamport_unenrolled_account() {
        let service = service();
        let mut rng = rand::thread_rng();
        let key = LamportKeyPair::generate(&mut rng).unwrap();
        let next = LamportKeyPair::generate(&mut rng).unwrap().commitment();

        let request = lamport_call(&service, key, [0x77; 20], next, 0, "orphan");
        assert_eq!(service.authorize(&request), Err(AuthError::NotEnrolled));
    }

    // =========================================================================
    // CONCURRENCY
    // =========================================================================

    #[test]
    fn test_racing_submissions_single_winner() {
        let service = Arc::new(service());
        let (sk, vk) = generate_keypair();
        let domain = service.config().domain.clone();
        let request = Arc::new(ecdsa_request(
            &sk,
            &domain,
            withdraw([0xAB; 20], 42, "race"),
            ReplayProtection::Sequential { nonce: 0 },
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                let request = Arc::clone(&request);
                std::thread::spawn(move || service.authorize(&request))
            })
            .collect();

        let outcomes: Vec<_> = handles.into_iter().filter_map(|h| h.join().ok()).collect();
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes.iter().filter(|r| r.is_err()).all(|r| matches!(
            r,
            Err(AuthError::StaleOrReusedNonce { .. })
        )));
        assert_eq!(service.nonce_of(&address_from_pubkey(&vk)).unwrap(), 1);
    }
}
