//! # ECDSA Recovery Guard (secp256k1)
//!
//! Validates and canonicalizes recoverable signatures before recovery.
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: S must be at most SECP256K1_HALF_ORDER,
//!   checked first, before the signature or digest is used for anything else
//! - **Scalar Range Validation**: R in [1, n-1], S non-zero
//! - **Zero Address**: a recovered all-zero address is never reported as success
//! - **Constant-Time Operations**: Uses `subtle` crate for side-channel resistance
//!
//! Replay keys must never be derived from signature bytes; see
//! [`crate::domain::replay::ReplayKey`].

use super::entities::{
    Address, BatchVerificationResult, EcdsaSignature, Hash, VerificationRequest,
    VerificationResult,
};
use super::errors::AuthError;
use super::hasher::keccak256;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

/// secp256k1 curve order n
/// n = 0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141
pub(crate) const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// floor(n / 2)
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

const ZERO_ADDRESS: Address = [0u8; 20];

// =============================================================================
// ECDSA VERIFIER
// =============================================================================

/// ECDSA recovery guard.
#[derive(Debug, Clone)]
pub struct EcdsaVerifier {
    /// Batches at least this large are recovered on the rayon pool.
    parallel_threshold: usize,
}

impl Default for EcdsaVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_PARALLEL_THRESHOLD)
    }
}

/// Default batch size from which recovery runs in parallel.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 16;

impl EcdsaVerifier {
    /// Create a new guard.
    pub fn new(parallel_threshold: usize) -> Self {
        Self { parallel_threshold }
    }

    /// Recover the signer address, optionally checking it against `expected`.
    pub fn recover(
        &self,
        digest: &Hash,
        signature: &EcdsaSignature,
        expected: Option<Address>,
    ) -> Result<Address, AuthError> {
        let address = recover(digest, signature)?;
        match expected {
            Some(expected) if !addresses_equal(&expected, &address) => {
                Err(AuthError::InvalidSignature)
            }
            _ => Ok(address),
        }
    }

    /// Recover many signers, one result per request in request order.
    pub fn batch_recover(&self, requests: &[VerificationRequest]) -> BatchVerificationResult {
        use rayon::prelude::*;

        let single = |req: &VerificationRequest| -> VerificationResult {
            self.recover(&req.digest, &req.signature, req.expected_signer)
                .into()
        };

        let results: Vec<VerificationResult> = if requests.len() >= self.parallel_threshold {
            requests.par_iter().map(single).collect()
        } else {
            requests.iter().map(single).collect()
        };

        BatchVerificationResult::from_results(results)
    }
}

// =============================================================================
// CORE RECOVERY
// =============================================================================

/// Recover the signer's address from a signature over `digest`.
///
/// Checks, in order:
/// 1. S is in the lower half of the curve order (EIP-2)
/// 2. S is non-zero, R is in [1, n-1]
/// 3. Recovery ID (v) is 0, 1, 27, or 28
/// 4. Public key recovery succeeds
/// 5. The recovered address is not the zero address
pub fn recover(digest: &Hash, signature: &EcdsaSignature) -> Result<Address, AuthError> {
    if !is_low_s(&signature.s) {
        return Err(AuthError::MalleableSignature);
    }
    if is_zero(&signature.s) || !is_valid_scalar(&signature.r) {
        return Err(AuthError::MalformedInput("ecdsa scalar out of range"));
    }
    let recovery_id = parse_recovery_id(signature.v)?;

    // sig_bytes is zeroized after parsing
    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);
    let parsed = Signature::from_slice(&sig_bytes);
    sig_bytes.zeroize();
    let sig = parsed.map_err(|_| AuthError::MalformedInput("ecdsa signature encoding"))?;

    let recovered_key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| AuthError::InvalidSignature)?;

    ensure_nonzero(address_from_pubkey(&recovered_key))
}

/// Reject the zero-address sentinel.
pub fn ensure_nonzero(address: Address) -> Result<Address, AuthError> {
    if addresses_equal(&address, &ZERO_ADDRESS) {
        return Err(AuthError::ZeroAddress);
    }
    Ok(address)
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Derive Ethereum address from public key.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let pubkey_bytes = public_key.to_encoded_point(false);
    // Keccak256 of the public key without the 0x04 prefix; last 20 bytes
    let hash = keccak256(&pubkey_bytes.as_bytes()[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

fn addresses_equal(a: &Address, b: &Address) -> bool {
    a[..].ct_eq(&b[..]).into()
}

/// Constant-time big-endian `a < b`.
pub(crate) fn ct_less_than(a: &[u8; 32], b: &[u8; 32]) -> Choice {
    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);

    for i in 0..32 {
        let not_decided = !(less | greater);
        let byte_less = Choice::from((a[i] < b[i]) as u8);
        let byte_greater = Choice::from((a[i] > b[i]) as u8);

        less |= not_decided & byte_less;
        greater |= not_decided & byte_greater;
    }

    less
}

/// Check if S value is at most half the curve order (EIP-2).
///
/// Constant-time: runs in fixed time regardless of the value of `s`.
fn is_low_s(s: &[u8; 32]) -> bool {
    // s <= half  <=>  !(half < s)
    (!ct_less_than(&SECP256K1_HALF_ORDER, s)).into()
}

fn is_zero(scalar: &[u8; 32]) -> bool {
    let mut zero = Choice::from(1u8);
    for &byte in scalar {
        zero &= byte.ct_eq(&0u8);
    }
    zero.into()
}

/// Check if a scalar value is in valid range [1, n-1].
fn is_valid_scalar(scalar: &[u8; 32]) -> bool {
    !is_zero(scalar) && bool::from(ct_less_than(scalar, &SECP256K1_ORDER))
}

/// Parse recovery ID from v value.
///
/// Valid v values: 0, 1, 27, 28
fn parse_recovery_id(v: u8) -> Result<RecoveryId, AuthError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(AuthError::MalformedInput("ecdsa recovery id")),
    };

    RecoveryId::try_from(id).map_err(|_| AuthError::MalformedInput("ecdsa recovery id"))
}

/// Malleable twin of S: s' = n - s
pub fn invert_s(s: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: i32 = 0;

    for i in (0..32).rev() {
        let diff = (SECP256K1_ORDER[i] as i32) - (s[i] as i32) - borrow;
        if diff < 0 {
            result[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            result[i] = diff as u8;
            borrow = 0;
        }
    }

    result
}

/// Flip a recovery ID to match an inverted S.
pub fn flip_v(v: u8) -> u8 {
    match v {
        0 => 1,
        1 => 0,
        27 => 28,
        28 => 27,
        other => other,
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

/// Signing helpers for tests and benchmarks. Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_helpers {
    use super::*;
    use k256::ecdsa::SigningKey;

    /// Generate a new ECDSA keypair.
    pub fn generate_keypair() -> (SigningKey, VerifyingKey) {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        let verifying_key = *signing_key.verifying_key();
        (signing_key, verifying_key)
    }

    /// Sign a digest, normalized to low S with a 27/28 recovery id.
    pub fn sign(digest: &Hash, private_key: &SigningKey) -> EcdsaSignature {
        let (sig, recid) = private_key
            .sign_prehash_recoverable(digest)
            .expect("signing failed");

        let sig_bytes = sig.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&sig_bytes[..32]);
        s.copy_from_slice(&sig_bytes[32..]);

        let v = recid.to_byte() + 27;
        if is_low_s(&s) {
            EcdsaSignature { r, s, v }
        } else {
            EcdsaSignature {
                r,
                s: invert_s(&s),
                v: flip_v(v),
            }
        }
    }

    /// Malleable twin `(r, n - s, v')` of a signature.
    pub fn malleable_twin(signature: &EcdsaSignature) -> EcdsaSignature {
        EcdsaSignature {
            r: signature.r,
            s: invert_s(&signature.s),
            v: flip_v(signature.v),
        }
    }

    /// Create a valid verification request.
    pub fn create_valid_verification_request() -> VerificationRequest {
        let (private_key, public_key) = generate_keypair();
        let digest = keccak256(b"test message");

        VerificationRequest {
            digest,
            signature: sign(&digest, &private_key),
            expected_signer: Some(address_from_pubkey(&public_key)),
        }
    }

    /// Create an invalid verification request (high S).
    pub fn create_invalid_verification_request() -> VerificationRequest {
        VerificationRequest {
            digest: keccak256(b"test message"),
            signature: EcdsaSignature {
                r: [0xFF; 32],
                s: [0xFF; 32],
                v: 27,
            },
            expected_signer: None,
        }
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================
