//! # Authorization Errors
//!
//! Error taxonomy for every verification and replay-protection operation.
//!
//! Every variant is terminal: resubmitting the same input yields the same
//! error. Recovery means resubmitting with a corrected nonce or a freshly
//! rotated key.

use thiserror::Error;

/// Errors that can occur while authorizing a signed operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Bad encoding or length, rejected before any cryptographic work.
    #[error("Malformed input: {0}")]
    MalformedInput(&'static str),

    /// Generic cryptographic failure.
    ///
    /// Deliberately carries no detail about which internal check failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// ECDSA signature with S above half the curve order (EIP-2).
    #[error("Malleable signature (high S value)")]
    MalleableSignature,

    /// Recovery produced the all-zero sentinel address.
    #[error("Recovered zero address")]
    ZeroAddress,

    /// Supplied nonce does not match the stored counter.
    #[error("Stale or reused nonce: expected {expected}, got {supplied}")]
    StaleOrReusedNonce {
        /// Counter currently stored for the principal
        expected: u64,
        /// Nonce carried by the request
        supplied: u64,
    },

    /// Content-addressed message was already consumed.
    #[error("Digest already consumed")]
    DigestAlreadyConsumed,

    /// Revealed Lamport key does not match the current commitment.
    #[error("Stale Lamport commitment")]
    StaleCommitment,

    /// Key fails the curve or range precondition.
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(&'static str),

    /// No group key is registered under the requested identifier.
    #[error("Unknown group key")]
    UnknownGroupKey,

    /// Signature was produced for another chain or contract.
    #[error("Domain mismatch: {0}")]
    DomainMismatch(&'static str),

    /// Lamport account has no enrolled commitment.
    #[error("Account not enrolled")]
    NotEnrolled,

    /// Lamport account already holds a commitment.
    #[error("Account already enrolled")]
    AlreadyEnrolled,

    /// Stored state violates a core invariant (corrupted storage or provisioning bug).
    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),

    /// Backend failure reported by a pluggable store.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// Short stable label, used for logging rejections without payload detail.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MalformedInput(_) => "malformed_input",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::MalleableSignature => "malleable_signature",
            AuthError::ZeroAddress => "zero_address",
            AuthError::StaleOrReusedNonce { .. } => "stale_nonce",
            AuthError::DigestAlreadyConsumed => "digest_consumed",
            AuthError::StaleCommitment => "stale_commitment",
            AuthError::InvalidKeyMaterial(_) => "invalid_key_material",
            AuthError::UnknownGroupKey => "unknown_group_key",
            AuthError::DomainMismatch(_) => "domain_mismatch",
            AuthError::NotEnrolled => "not_enrolled",
            AuthError::AlreadyEnrolled => "already_enrolled",
            AuthError::InvariantViolation(_) => "invariant_violation",
            AuthError::Storage(_) => "storage",
        }
    }
}
