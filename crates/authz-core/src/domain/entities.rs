//! # Domain Entities
//!
//! Core data structures shared by the verifiers, the replay registry and the
//! authorization service.

use super::errors::AuthError;
use super::hasher::{DomainSeparator, StructHash, TypedDigest};
use super::replay::ReplayKey;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;

/// 32-byte Keccak256 output.
pub type Hash = [u8; 32];

/// Ethereum-style address (last 20 bytes of keccak256 of an uncompressed key).
pub type Address = [u8; 20];

/// Authenticated identity derived from a verified signature.
pub type Principal = Address;

/// Identifier under which a FROST group key is provisioned in the key store.
pub type GroupId = [u8; 32];

/// Number of message-digest bits covered by one Lamport key.
pub const LAMPORT_BITS: usize = 256;

/// Encoded ECDSA signature length (`r || s || v`).
pub const ECDSA_SIGNATURE_LEN: usize = 65;

/// Encoded FROST signature length (`rx || ry || z`).
pub const FROST_SIGNATURE_LEN: usize = 96;

/// Encoded Lamport signature length (preimages, public halves, next commitment).
pub const LAMPORT_SIGNATURE_LEN: usize = LAMPORT_BITS * 32 + LAMPORT_BITS * 64 + 32;

// =============================================================================
// Scheme Tags
// =============================================================================

/// Signature scheme tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemeTag {
    /// secp256k1 ECDSA with public-key recovery
    Ecdsa,
    /// FROST threshold Schnorr over secp256k1
    Frost,
    /// Lamport one-time signature
    Lamport,
}

impl fmt::Display for SchemeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemeTag::Ecdsa => write!(f, "ecdsa"),
            SchemeTag::Frost => write!(f, "frost"),
            SchemeTag::Lamport => write!(f, "lamport"),
        }
    }
}

// =============================================================================
// ECDSA Types (secp256k1)
// =============================================================================

/// Recoverable ECDSA signature on the secp256k1 curve.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcdsaSignature {
    /// R component (32 bytes)
    pub r: [u8; 32],
    /// S component (32 bytes)
    pub s: [u8; 32],
    /// Recovery ID (0, 1, 27, or 28)
    pub v: u8,
}

impl EcdsaSignature {
    /// Split a raw `r || s || v` encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AuthError> {
        if bytes.len() != ECDSA_SIGNATURE_LEN {
            return Err(AuthError::MalformedInput("ecdsa signature must be 65 bytes"));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v: bytes[64] })
    }

    /// Encode as `r || s || v`.
    pub fn to_bytes(&self) -> [u8; ECDSA_SIGNATURE_LEN] {
        let mut out = [0u8; ECDSA_SIGNATURE_LEN];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }
}

/// Request to recover one ECDSA signer.
#[derive(Clone, Debug)]
pub struct VerificationRequest {
    /// The digest that was signed
    pub digest: Hash,
    /// The signature to verify
    pub signature: EcdsaSignature,
    /// Optional expected signer (checked against the recovered address)
    pub expected_signer: Option<Address>,
}

/// Result of a single ECDSA recovery.
#[derive(Clone, Debug)]
pub struct VerificationResult {
    /// Whether the signature is valid
    pub valid: bool,
    /// The recovered address (if verification succeeded)
    pub recovered_address: Option<Address>,
    /// Error details (if verification failed)
    pub error: Option<AuthError>,
}

impl VerificationResult {
    /// Create a successful verification result.
    pub fn valid(recovered_address: Address) -> Self {
        Self {
            valid: true,
            recovered_address: Some(recovered_address),
            error: None,
        }
    }

    /// Create a failed verification result.
    pub fn invalid(error: AuthError) -> Self {
        Self {
            valid: false,
            recovered_address: None,
            error: Some(error),
        }
    }
}

impl From<Result<Address, AuthError>> for VerificationResult {
    fn from(result: Result<Address, AuthError>) -> Self {
        match result {
            Ok(address) => Self::valid(address),
            Err(e) => Self::invalid(e),
        }
    }
}

/// Result of batch ECDSA recovery.
#[derive(Clone, Debug)]
pub struct BatchVerificationResult {
    /// Individual results for each request, in request order
    pub results: Vec<VerificationResult>,
    /// Whether all verifications passed
    pub all_valid: bool,
    /// Count of valid signatures
    pub valid_count: usize,
    /// Count of invalid signatures
    pub invalid_count: usize,
}

impl BatchVerificationResult {
    /// Create a batch result from individual results.
    pub fn from_results(results: Vec<VerificationResult>) -> Self {
        let valid_count = results.iter().filter(|r| r.valid).count();
        let invalid_count = results.len() - valid_count;

        Self {
            results,
            all_valid: invalid_count == 0,
            valid_count,
            invalid_count,
        }
    }
}

// =============================================================================
// FROST Types
// =============================================================================

/// FROST group public key as an affine point (big-endian coordinates).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrostPublicKey {
    /// Affine x-coordinate
    pub x: [u8; 32],
    /// Affine y-coordinate
    pub y: [u8; 32],
}

/// FROST group signature `(R, z)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrostSignature {
    /// Commitment x-coordinate
    pub rx: [u8; 32],
    /// Commitment y-coordinate
    pub ry: [u8; 32],
    /// Response scalar, must lie in (0, N)
    pub z: [u8; 32],
}

impl FrostSignature {
    /// Split a raw `rx || ry || z` encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AuthError> {
        if bytes.len() != FROST_SIGNATURE_LEN {
            return Err(AuthError::MalformedInput("frost signature must be 96 bytes"));
        }
        let mut sig = Self {
            rx: [0u8; 32],
            ry: [0u8; 32],
            z: [0u8; 32],
        };
        sig.rx.copy_from_slice(&bytes[..32]);
        sig.ry.copy_from_slice(&bytes[32..64]);
        sig.z.copy_from_slice(&bytes[64..]);
        Ok(sig)
    }

    /// Encode as `rx || ry || z`.
    pub fn to_bytes(&self) -> [u8; FROST_SIGNATURE_LEN] {
        let mut out = [0u8; FROST_SIGNATURE_LEN];
        out[..32].copy_from_slice(&self.rx);
        out[32..64].copy_from_slice(&self.ry);
        out[64..].copy_from_slice(&self.z);
        out
    }
}

// =============================================================================
// Lamport Types
// =============================================================================

/// Public half of a Lamport one-time key: `LAMPORT_BITS` pairs of hashes.
///
/// Deserialization goes through [`LamportPublicKey::from_halves`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<[Hash; 2]>", into = "Vec<[Hash; 2]>")]
pub struct LamportPublicKey {
    halves: Vec<[Hash; 2]>,
}

impl LamportPublicKey {
    /// Build from exactly `LAMPORT_BITS` pairs.
    pub fn from_halves(halves: Vec<[Hash; 2]>) -> Result<Self, AuthError> {
        if halves.len() != LAMPORT_BITS {
            return Err(AuthError::MalformedInput("lamport key must have 256 pairs"));
        }
        Ok(Self { halves })
    }

    /// Public half selected by `bit` at position `index`.
    pub fn half(&self, index: usize, bit: u8) -> Option<&Hash> {
        self.halves
            .get(index)
            .map(|pair| &pair[(bit & 1) as usize])
    }

    /// All pairs in order.
    pub fn halves(&self) -> &[[Hash; 2]] {
        &self.halves
    }
}

impl TryFrom<Vec<[Hash; 2]>> for LamportPublicKey {
    type Error = AuthError;

    fn try_from(halves: Vec<[Hash; 2]>) -> Result<Self, Self::Error> {
        Self::from_halves(halves)
    }
}

impl From<LamportPublicKey> for Vec<[Hash; 2]> {
    fn from(key: LamportPublicKey) -> Self {
        key.halves
    }
}

/// A revealed Lamport signature together with the next commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LamportSignature {
    /// One revealed preimage per digest bit
    pub preimages: Vec<Hash>,
    /// The full one-time public key being consumed
    pub public_key: LamportPublicKey,
    /// Commitment to the successor key
    pub next_pkh: Hash,
}

impl LamportSignature {
    /// Split a raw encoding: preimages, then public halves (pair-major), then `next_pkh`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AuthError> {
        if bytes.len() != LAMPORT_SIGNATURE_LEN {
            return Err(AuthError::MalformedInput(
                "lamport signature has wrong length",
            ));
        }
        let (pre_bytes, rest) = bytes.split_at(LAMPORT_BITS * 32);
        let (pub_bytes, next) = rest.split_at(LAMPORT_BITS * 64);

        let preimages = pre_bytes.chunks_exact(32).map(to_hash).collect();
        let halves = pub_bytes
            .chunks_exact(64)
            .map(|pair| [to_hash(&pair[..32]), to_hash(&pair[32..])])
            .collect();

        Ok(Self {
            preimages,
            public_key: LamportPublicKey::from_halves(halves)?,
            next_pkh: to_hash(next),
        })
    }

    /// Encode in the layout accepted by [`LamportSignature::from_bytes`].
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(LAMPORT_SIGNATURE_LEN);
        for preimage in &self.preimages {
            out.extend_from_slice(preimage);
        }
        for [zero, one] in self.public_key.halves() {
            out.extend_from_slice(zero);
            out.extend_from_slice(one);
        }
        out.extend_from_slice(&self.next_pkh);
        out
    }
}

/// Stored Lamport state for one account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LamportAccount {
    /// Commitment to the currently valid one-time public key
    pub pkh: Hash,
    /// Number of successful rotations
    pub counter: u64,
}

fn to_hash(bytes: &[u8]) -> Hash {
    let mut out = [0u8; 32];
    out.copy_from_slice(bytes);
    out
}

// =============================================================================
// Signature Records
// =============================================================================

/// Raw signature as delivered by the calling layer.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawSignature {
    /// 65-byte `r || s || v`
    Ecdsa {
        /// Encoded signature
        #[serde_as(as = "Bytes")]
        bytes: Vec<u8>,
        /// Optional signer the recovered address must equal
        expected_signer: Option<Address>,
    },
    /// 96-byte `rx || ry || z` by a provisioned group
    Frost {
        /// Key-store identifier of the group key
        group: GroupId,
        /// Encoded signature
        #[serde_as(as = "Bytes")]
        bytes: Vec<u8>,
    },
    /// Lamport reveal for an enrolled account
    Lamport {
        /// Enrolled account consuming its commitment
        account: Address,
        /// Encoded signature
        #[serde_as(as = "Bytes")]
        bytes: Vec<u8>,
    },
}

impl RawSignature {
    /// Scheme tag of this raw signature.
    pub fn scheme(&self) -> SchemeTag {
        match self {
            RawSignature::Ecdsa { .. } => SchemeTag::Ecdsa,
            RawSignature::Frost { .. } => SchemeTag::Frost,
            RawSignature::Lamport { .. } => SchemeTag::Lamport,
        }
    }
}

/// Decoded, scheme-specific signature payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignaturePayload {
    /// ECDSA recovery
    Ecdsa {
        /// Split signature
        signature: EcdsaSignature,
        /// Optional signer the recovered address must equal
        expected_signer: Option<Address>,
    },
    /// FROST group signature
    Frost {
        /// Key-store identifier of the group key
        group: GroupId,
        /// Split signature
        signature: FrostSignature,
    },
    /// Lamport one-time signature
    Lamport {
        /// Enrolled account consuming its commitment
        account: Address,
        /// Split signature
        signature: LamportSignature,
    },
}

impl SignaturePayload {
    /// Scheme tag of this payload.
    pub fn scheme(&self) -> SchemeTag {
        match self {
            SignaturePayload::Ecdsa { .. } => SchemeTag::Ecdsa,
            SignaturePayload::Frost { .. } => SchemeTag::Frost,
            SignaturePayload::Lamport { .. } => SchemeTag::Lamport,
        }
    }
}

/// Immutable pairing of a decoded signature and the digest it must cover.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureRecord {
    payload: SignaturePayload,
    digest: TypedDigest,
}

impl SignatureRecord {
    /// Decode a raw signature. Fails with `MalformedInput` before any curve work.
    pub fn decode(raw: &RawSignature, digest: TypedDigest) -> Result<Self, AuthError> {
        let payload = match raw {
            RawSignature::Ecdsa {
                bytes,
                expected_signer,
            } => SignaturePayload::Ecdsa {
                signature: EcdsaSignature::from_bytes(bytes)?,
                expected_signer: *expected_signer,
            },
            RawSignature::Frost { group, bytes } => SignaturePayload::Frost {
                group: *group,
                signature: FrostSignature::from_bytes(bytes)?,
            },
            RawSignature::Lamport { account, bytes } => SignaturePayload::Lamport {
                account: *account,
                signature: LamportSignature::from_bytes(bytes)?,
            },
        };
        Ok(Self { payload, digest })
    }

    /// Scheme tag.
    pub fn scheme(&self) -> SchemeTag {
        self.payload.scheme()
    }

    /// Decoded payload.
    pub fn payload(&self) -> &SignaturePayload {
        &self.payload
    }

    /// Canonical digest the signature covers.
    pub fn digest(&self) -> &TypedDigest {
        &self.digest
    }
}

// =============================================================================
// Authorization Request/Result Types
// =============================================================================

/// How a request is protected against replay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayProtection {
    /// Per-principal monotonic counter; the request must carry the current value
    Sequential {
        /// Nonce the signer committed to
        nonce: u64,
    },
    /// Idempotent consumed-set keyed by the message digest (orders, intents)
    ContentAddressed,
}

/// Everything the calling layer supplies for one authorization.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Domain the signer claims to have signed under
    pub domain: DomainSeparator,
    /// Hash of the canonical message fields
    pub struct_hash: StructHash,
    /// Raw signature
    pub signature: RawSignature,
    /// Replay-protection mode
    pub replay: ReplayProtection,
}

/// A single state change committed alongside an accepted signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateDelta {
    /// The principal's counter moved to `new_nonce`
    NonceAdvanced {
        /// Principal whose counter moved
        principal: Principal,
        /// Counter value after the commit
        new_nonce: u64,
    },
    /// A content-addressed message was marked consumed
    DigestConsumed {
        /// Key inserted in the consumed-set
        key: ReplayKey,
    },
    /// A Lamport commitment was rotated
    CommitmentRotated {
        /// Account whose commitment rotated
        account: Address,
        /// New commitment
        new_pkh: Hash,
        /// Rotation counter after the commit
        counter: u64,
    },
}

/// Successful authorization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Authorization {
    /// Authenticated principal
    pub principal: Principal,
    /// Scheme that authenticated it
    pub scheme: SchemeTag,
    /// Digest that was signed
    pub digest: TypedDigest,
    /// State changes committed atomically with acceptance
    pub deltas: Vec<StateDelta>,
}
