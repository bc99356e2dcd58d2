//! # Inbound Ports (Driving Ports / API)
//!
//! Traits that define the public API of the authorization core.

use crate::domain::entities::{
    Address, Authorization, AuthorizationRequest, BatchVerificationResult, EcdsaSignature,
    FrostSignature, GroupId, Hash, LamportAccount, Principal, StateDelta, VerificationRequest,
};
use crate::domain::errors::AuthError;
use crate::domain::hasher::TypedDigest;

/// Primary authorization API.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait AuthorizationApi: Send + Sync {
    // =========================================================================
    // Full Authorization
    // =========================================================================

    /// Hash, verify, and consume one request.
    ///
    /// Replay state and Lamport commitments change only when this returns
    /// `Ok`, and always together.
    fn authorize(&self, request: &AuthorizationRequest) -> Result<Authorization, AuthError>;

    // =========================================================================
    // Stateless Verification
    // =========================================================================

    /// Recover an ECDSA signer from a 65-byte `r || s || v` encoding.
    fn recover_ecdsa(&self, digest: &Hash, signature: &[u8]) -> Result<Address, AuthError>;

    /// Recover many ECDSA signers, in parallel for large batches.
    fn batch_recover(&self, requests: &[VerificationRequest]) -> BatchVerificationResult;

    /// Recover an ECDSA signer from split components.
    fn recover_ecdsa_parts(
        &self,
        digest: &Hash,
        signature: &EcdsaSignature,
    ) -> Result<Address, AuthError>;

    /// Verify a FROST signature by a provisioned group.
    fn verify_frost(
        &self,
        group: &GroupId,
        digest: &TypedDigest,
        signature: &FrostSignature,
    ) -> Result<bool, AuthError>;

    /// Verify a Merkle inclusion proof.
    fn verify_inclusion(&self, leaf: &[u8], siblings: &[Hash], path_bits: u64, root: &Hash)
        -> bool;

    // =========================================================================
    // Registry
    // =========================================================================

    /// Record the first Lamport commitment for `account`.
    fn enroll_lamport(&self, account: Address, pkh: Hash) -> Result<LamportAccount, AuthError>;

    /// Consume `supplied` for `principal` without a signature check.
    fn consume_nonce(&self, principal: Principal, supplied: u64) -> Result<StateDelta, AuthError>;

    /// Current counter for `principal`.
    fn nonce_of(&self, principal: &Principal) -> Result<u64, AuthError>;

    /// Lamport state for `account`, if enrolled.
    fn lamport_state(&self, account: &Address) -> Result<Option<LamportAccount>, AuthError>;
}
