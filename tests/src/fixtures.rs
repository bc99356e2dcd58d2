//! Shared fixtures: services, signers and request builders.

use authz_core::domain::ecdsa::test_helpers::sign;
use authz_core::{
    typed_data_digest, AuthorizationConfig, AuthorizationRequest, AuthorizationService,
    DomainSeparator, InMemoryKeyStore, InMemoryReplayStore, RawSignature, ReplayProtection,
    StructEncoder, StructHash,
};
use k256::ecdsa::SigningKey;
use std::sync::Once;

/// Service type used throughout the suite.
pub type TestService = AuthorizationService<InMemoryReplayStore, InMemoryKeyStore>;

static TRACING: Once = Once::new();

/// Install a test subscriber honoring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Service over fresh in-memory stores with the testing config.
pub fn service() -> TestService {
    service_with(AuthorizationConfig::for_testing())
}

/// Service over fresh in-memory stores with `config`.
pub fn service_with(config: AuthorizationConfig) -> TestService {
    init_tracing();
    let keys = InMemoryKeyStore::new(authz_core::FrostVerifier::new(
        config.frost_key_policy,
        config.frost_transcript,
    ));
    AuthorizationService::new(config, InMemoryReplayStore::new(), keys)
        .expect("testing config is valid")
}

/// `Withdraw(address to,uint256 amount,string memo)` struct hash.
pub fn withdraw(to: [u8; 20], amount: u64, memo: &str) -> StructHash {
    StructEncoder::new("Withdraw(address to,uint256 amount,string memo)")
        .push_address(&to)
        .push_u64(amount)
        .push_string(memo)
        .finish()
}

/// ECDSA-signed request over `struct_hash` under `domain`.
pub fn ecdsa_request(
    key: &SigningKey,
    domain: &DomainSeparator,
    struct_hash: StructHash,
    replay: ReplayProtection,
) -> AuthorizationRequest {
    let digest = typed_data_digest(domain, &struct_hash);
    AuthorizationRequest {
        domain: domain.clone(),
        struct_hash,
        signature: RawSignature::Ecdsa {
            bytes: sign(digest.as_bytes(), key).to_bytes().to_vec(),
            expected_signer: None,
        },
        replay,
    }
}
