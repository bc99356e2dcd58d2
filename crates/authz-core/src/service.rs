//! # Authorization Service
//!
//! Application service implementing [`AuthorizationApi`].
//!
//! ## Flow
//!
//! 1. Domain policy (chain id, verifying contract, allow-list)
//! 2. Canonical digest from the Hasher
//! 3. Decode the raw signature (length checks only)
//! 4. Inside one [`ReplayStore::atomically`] transaction: authenticate with the
//!    scheme's [`SchemeVerifier`], then consume the nonce or digest
//!
//! A failure at any step leaves every registry untouched.

use crate::config::{AuthorizationConfig, ConfigError};
use crate::domain::ecdsa::EcdsaVerifier;
use crate::domain::entities::{
    Address, Authorization, AuthorizationRequest, BatchVerificationResult, EcdsaSignature,
    FrostPublicKey, FrostSignature, GroupId, Hash, LamportAccount, Principal, ReplayProtection,
    SchemeTag, SignaturePayload, SignatureRecord, StateDelta, VerificationRequest,
};
use crate::domain::errors::AuthError;
use crate::domain::frost::FrostVerifier;
use crate::domain::hasher::{check_domain, typed_data_digest, TypedDigest};
use crate::domain::lamport::LamportVerifier;
use crate::domain::merkle;
use crate::domain::replay::{self, ReplayKey};
use crate::domain::scheme::SchemeVerifier;
use crate::ports::inbound::AuthorizationApi;
use crate::ports::outbound::{KeyStore, ReplayStore};
use tracing::{debug, error, warn};

/// Authorization service over a replay store and a key store.
pub struct AuthorizationService<S: ReplayStore, K: KeyStore> {
    config: AuthorizationConfig,
    store: S,
    keys: K,
    ecdsa: EcdsaVerifier,
    frost: FrostVerifier,
    lamport: LamportVerifier,
}

impl<S: ReplayStore, K: KeyStore> AuthorizationService<S, K> {
    /// Create a service. Fails if `config` does not validate.
    pub fn new(config: AuthorizationConfig, store: S, keys: K) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            ecdsa: EcdsaVerifier::new(config.parallel_threshold),
            frost: FrostVerifier::new(config.frost_key_policy, config.frost_transcript),
            lamport: LamportVerifier::new(config.domain.clone()),
            config,
            store,
            keys,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &AuthorizationConfig {
        &self.config
    }

    /// Replay store handle.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Key store handle.
    pub fn keys(&self) -> &K {
        &self.keys
    }

    fn resolve_group(&self, group: &GroupId) -> Result<FrostPublicKey, AuthError> {
        self.keys
            .frost_group_key(group)?
            .ok_or(AuthError::UnknownGroupKey)
    }

    fn authorize_inner(&self, request: &AuthorizationRequest) -> Result<Authorization, AuthError> {
        check_domain(
            &request.domain,
            &self.config.domain,
            &self.config.allowed_contracts,
        )?;

        let digest = typed_data_digest(&request.domain, &request.struct_hash);
        let record = SignatureRecord::decode(&request.signature, digest)?;

        let bound_frost = match record.payload() {
            SignaturePayload::Frost { group, .. } => {
                Some(self.frost.bind(*group, self.resolve_group(group)?))
            }
            _ => None,
        };
        let verifier: &dyn SchemeVerifier = match (record.scheme(), bound_frost.as_ref()) {
            (SchemeTag::Ecdsa, _) => &self.ecdsa,
            (SchemeTag::Frost, Some(bound)) => bound,
            (SchemeTag::Frost, None) => return Err(AuthError::UnknownGroupKey),
            (SchemeTag::Lamport, _) => &self.lamport,
        };

        self.store.atomically(|txn| {
            let authenticated = verifier.authenticate(&record, txn)?;
            let mut deltas = authenticated.deltas;

            deltas.push(match request.replay {
                ReplayProtection::Sequential { nonce } => {
                    replay::consume(txn, authenticated.principal, nonce)?
                }
                ReplayProtection::ContentAddressed => {
                    replay::consume_digest(txn, ReplayKey::from(record.digest()))?
                }
            });

            Ok(Authorization {
                principal: authenticated.principal,
                scheme: record.scheme(),
                digest: *record.digest(),
                deltas,
            })
        })
    }
}

fn log_rejection(scheme: SchemeTag, e: &AuthError) {
    match e {
        AuthError::InvariantViolation(what) => {
            error!(%scheme, "[authz] invariant violation: {}", what)
        }
        _ => warn!(%scheme, kind = e.kind(), "[authz] authorization rejected"),
    }
}

impl<S: ReplayStore, K: KeyStore> AuthorizationApi for AuthorizationService<S, K> {
    fn authorize(&self, request: &AuthorizationRequest) -> Result<Authorization, AuthError> {
        let scheme = request.signature.scheme();
        match self.authorize_inner(request) {
            Ok(authorization) => {
                debug!(
                    %scheme,
                    principal = %hex::encode(authorization.principal),
                    deltas = authorization.deltas.len(),
                    "[authz] authorized"
                );
                Ok(authorization)
            }
            Err(e) => {
                log_rejection(scheme, &e);
                Err(e)
            }
        }
    }

    fn recover_ecdsa(&self, digest: &Hash, signature: &[u8]) -> Result<Address, AuthError> {
        let signature = EcdsaSignature::from_bytes(signature)?;
        self.recover_ecdsa_parts(digest, &signature)
    }

    fn batch_recover(&self, requests: &[VerificationRequest]) -> BatchVerificationResult {
        let batch = self.ecdsa.batch_recover(requests);
        if !batch.all_valid {
            debug!(
                invalid = batch.invalid_count,
                total = batch.results.len(),
                "[authz] batch recovery had failures"
            );
        }
        batch
    }

    fn recover_ecdsa_parts(
        &self,
        digest: &Hash,
        signature: &EcdsaSignature,
    ) -> Result<Address, AuthError> {
        self.ecdsa.recover(digest, signature, None)
    }

    fn verify_frost(
        &self,
        group: &GroupId,
        digest: &TypedDigest,
        signature: &FrostSignature,
    ) -> Result<bool, AuthError> {
        let key = self.resolve_group(group)?;
        Ok(self.frost.verify(&key, digest.as_bytes(), signature))
    }

    fn verify_inclusion(
        &self,
        leaf: &[u8],
        siblings: &[Hash],
        path_bits: u64,
        root: &Hash,
    ) -> bool {
        merkle::verify(leaf, siblings, path_bits, root)
    }

    fn enroll_lamport(&self, account: Address, pkh: Hash) -> Result<LamportAccount, AuthError> {
        let state = self
            .store
            .atomically(|txn| self.lamport.enroll(txn, account, pkh))?;
        debug!(account = %hex::encode(account), "[authz] lamport account enrolled");
        Ok(state)
    }

    fn consume_nonce(&self, principal: Principal, supplied: u64) -> Result<StateDelta, AuthError> {
        self.store
            .atomically(|txn| replay::consume(txn, principal, supplied))
    }

    fn nonce_of(&self, principal: &Principal) -> Result<u64, AuthError> {
        self.store.atomically(|txn| txn.nonce(principal))
    }

    fn lamport_state(&self, account: &Address) -> Result<Option<LamportAccount>, AuthError> {
        self.store.atomically(|txn| txn.lamport(account))
    }
}
