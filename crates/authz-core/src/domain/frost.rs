//! # FROST Schnorr Verifier (secp256k1)
//!
//! Verifies aggregated threshold Schnorr signatures `(R, z)` against a group
//! public key `P`:
//!
//! ```text
//! e  = keccak256(transcript) mod n
//! R' = z·G - e·P
//! accept iff R' == R
//! ```
//!
//! The check runs on `k256` projective arithmetic directly. Keys are validated
//! at registration time and again on every verification.
//!
//! ## Transcript V1
//!
//! ```text
//! keccak256( keccak256("FROST-secp256k1-KECCAK256-v1")
//!          || Rx || Ry || Px || Py || keccak256(message) )
//! ```
//!
//! All elements are 32-byte big-endian words. The field order is part of the
//! scheme identity; a different order needs a new [`TranscriptVersion`].

use super::ecdsa::{ct_less_than, SECP256K1_ORDER};
use super::entities::{Address, FrostPublicKey, FrostSignature, Hash};
use super::hasher::{keccak256, keccak256_words};
use k256::elliptic_curve::bigint::U256;
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::FromEncodedPoint;
use k256::elliptic_curve::{Field, PrimeField};
use k256::{AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, Scalar};
use serde::{Deserialize, Serialize};

/// Challenge transcript layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranscriptVersion {
    /// `tag || Rx || Ry || Px || Py || keccak256(message)`
    #[default]
    V1,
}

impl TranscriptVersion {
    /// Domain tag hashed into the first transcript word.
    pub fn tag(&self) -> &'static str {
        match self {
            TranscriptVersion::V1 => "FROST-secp256k1-KECCAK256-v1",
        }
    }
}

/// Group-key acceptance policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyPolicy {
    /// Also require `P.x < n`, so registered keys stay verifiable by
    /// on-chain verifiers that rely on the ecrecover scalar-multiplication trick.
    #[default]
    RecoveryCompatible,
    /// Curve membership and non-identity only.
    Direct,
}

/// FROST group-signature verifier.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrostVerifier {
    policy: KeyPolicy,
    transcript: TranscriptVersion,
}

impl FrostVerifier {
    /// Create a verifier for the given key policy and transcript.
    pub fn new(policy: KeyPolicy, transcript: TranscriptVersion) -> Self {
        Self { policy, transcript }
    }

    /// Key policy in force.
    pub fn policy(&self) -> KeyPolicy {
        self.policy
    }

    /// On-curve, non-identity, and (under `RecoveryCompatible`) `P.x < n`.
    pub fn is_valid_public_key(&self, key: &FrostPublicKey) -> bool {
        self.decode_key(key).is_some()
    }

    /// Verify `(R, z)` over `message`. Strict boolean; no partial acceptance.
    pub fn verify(&self, key: &FrostPublicKey, message: &[u8], signature: &FrostSignature) -> bool {
        let Some(p) = self.decode_key(key) else {
            return false;
        };
        let Some(r) = decode_point(&signature.rx, &signature.ry) else {
            return false;
        };
        let Some(z) = decode_nonzero_scalar(&signature.z) else {
            return false;
        };

        let e = challenge(self.transcript, signature, key, message);
        let r_prime = ProjectivePoint::GENERATOR * z - p * e;

        r_prime == r
    }

    fn decode_key(&self, key: &FrostPublicKey) -> Option<ProjectivePoint> {
        if self.policy == KeyPolicy::RecoveryCompatible
            && !bool::from(ct_less_than(&key.x, &SECP256K1_ORDER))
        {
            return None;
        }
        decode_point(&key.x, &key.y)
    }
}

/// Compute the challenge scalar `e`.
pub fn challenge(
    version: TranscriptVersion,
    signature: &FrostSignature,
    key: &FrostPublicKey,
    message: &[u8],
) -> Scalar {
    let digest = transcript_hash(version, signature, key, message);
    <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::from(digest))
}

fn transcript_hash(
    version: TranscriptVersion,
    signature: &FrostSignature,
    key: &FrostPublicKey,
    message: &[u8],
) -> Hash {
    match version {
        TranscriptVersion::V1 => keccak256_words(&[
            &keccak256(version.tag().as_bytes()),
            &signature.rx,
            &signature.ry,
            &key.x,
            &key.y,
            &keccak256(message),
        ]),
    }
}

/// Ethereum-style address of a group key: last 20 bytes of `keccak256(x || y)`.
pub fn group_address(key: &FrostPublicKey) -> Address {
    let hash = keccak256_words(&[&key.x, &key.y]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Decode affine coordinates; `None` if off-curve or the identity.
fn decode_point(x: &[u8; 32], y: &[u8; 32]) -> Option<ProjectivePoint> {
    let encoded =
        EncodedPoint::from_affine_coordinates(&FieldBytes::from(*x), &FieldBytes::from(*y), false);
    let affine: Option<AffinePoint> = AffinePoint::from_encoded_point(&encoded).into();
    let point = ProjectivePoint::from(affine?);
    if point == ProjectivePoint::IDENTITY {
        return None;
    }
    Some(point)
}

/// Decode a scalar in the open interval (0, n).
fn decode_nonzero_scalar(bytes: &[u8; 32]) -> Option<Scalar> {
    let scalar: Option<Scalar> = Scalar::from_repr(FieldBytes::from(*bytes)).into();
    scalar.filter(|s| !bool::from(s.is_zero()))
}

// =============================================================================
// TEST HELPERS
// =============================================================================

/// Signing helpers for tests and benchmarks. Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_helpers {
    use super::*;
    use k256::elliptic_curve::sec1::ToEncodedPoint;

    /// Affine coordinates of a point.
    pub fn coordinates(point: &ProjectivePoint) -> ([u8; 32], [u8; 32]) {
        let encoded = point.to_affine().to_encoded_point(false);
        let mut x = [0u8; 32];
        let mut y = [0u8; 32];
        x.copy_from_slice(encoded.x().expect("not identity"));
        y.copy_from_slice(encoded.y().expect("uncompressed"));
        (x, y)
    }

    /// Public key for a secret scalar.
    pub fn public_key(secret: &Scalar) -> FrostPublicKey {
        let (x, y) = coordinates(&(ProjectivePoint::GENERATOR * secret));
        FrostPublicKey { x, y }
    }

    /// Random scalar.
    pub fn random_scalar() -> Scalar {
        Scalar::random(&mut rand::thread_rng())
    }

    /// Single-party Schnorr signature under the V1 transcript.
    pub fn sign(secret: &Scalar, message: &[u8]) -> (FrostPublicKey, FrostSignature) {
        let key = public_key(secret);
        let k = random_scalar();
        let (rx, ry) = coordinates(&(ProjectivePoint::GENERATOR * k));
        let mut sig = FrostSignature { rx, ry, z: [0u8; 32] };
        let e = challenge(TranscriptVersion::V1, &sig, &key, message);
        sig.z = (k + e * secret).to_repr().into();
        (key, sig)
    }

    /// Trusted-dealer Shamir shares `(index, share)` of `secret`.
    pub fn split_secret(
        secret: &Scalar,
        threshold: usize,
        participants: u64,
    ) -> Vec<(u64, Scalar)> {
        let coefficients: Vec<Scalar> = (1..threshold).map(|_| random_scalar()).collect();
        (1..=participants)
            .map(|i| {
                let x = Scalar::from(i);
                let mut acc = Scalar::ZERO;
                for c in coefficients.iter().rev() {
                    acc = (acc + c) * x;
                }
                (i, acc + secret)
            })
            .collect()
    }

    /// Lagrange coefficient of `i` over `signers` at zero.
    pub fn lagrange(i: u64, signers: &[u64]) -> Scalar {
        let mut num = Scalar::ONE;
        let mut den = Scalar::ONE;
        for &j in signers.iter().filter(|&&j| j != i) {
            num *= Scalar::from(j);
            den *= Scalar::from(j) - Scalar::from(i);
        }
        num * den.invert().unwrap()
    }

    /// Aggregate a threshold signature from the given shares.
    ///
    /// Each signer contributes `R_i = k_i·G` and `z_i = k_i + λ_i·e·x_i`.
    pub fn threshold_sign(
        group_key: &FrostPublicKey,
        shares: &[(u64, Scalar)],
        message: &[u8],
    ) -> FrostSignature {
        let indices: Vec<u64> = shares.iter().map(|(i, _)| *i).collect();
        let nonces: Vec<Scalar> = shares.iter().map(|_| random_scalar()).collect();
        let commitment = nonces
            .iter()
            .fold(ProjectivePoint::IDENTITY, |acc, k| acc + ProjectivePoint::GENERATOR * k);

        let (rx, ry) = coordinates(&commitment);
        let mut sig = FrostSignature { rx, ry, z: [0u8; 32] };
        let e = challenge(TranscriptVersion::V1, &sig, group_key, message);

        let z = shares
            .iter()
            .zip(&nonces)
            .fold(Scalar::ZERO, |acc, ((i, x_i), k_i)| {
                acc + k_i + lagrange(*i, &indices) * e * x_i
            });
        sig.z = z.to_repr().into();
        sig
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================
