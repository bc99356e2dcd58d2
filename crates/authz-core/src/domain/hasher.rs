//! # Domain-Separated Hasher
//!
//! Canonical EIP-712 style digests for every scheme.
//!
//! ```text
//! digest          = keccak256(0x19 || 0x01 || domainSeparator || structHash)
//! domainSeparator = keccak256(typeHash || keccak(name) || keccak(version) || chainId || contract)
//! structHash      = keccak256(typeHash || word_1 || word_2 || ...)
//! ```
//!
//! [`StructEncoder`] only appends fixed-width 32-byte words. Dynamic fields
//! (`string`, `bytes`) are hashed before they are appended, so two adjacent
//! variable-length fields can never be concatenated raw.

use super::entities::{Address, Hash};
use super::errors::AuthError;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// Domain type string when the verifying contract is bound.
pub const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Keccak256 hash function.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Keccak256 over several fixed-width parts.
pub(crate) fn keccak256_words(parts: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

// =============================================================================
// DOMAIN SEPARATOR
// =============================================================================

/// Binds a signature to (name, version, chain, contract).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSeparator {
    /// Human-readable signing domain name
    pub name: String,
    /// Current major version of the signing domain
    pub version: String,
    /// Chain the signature is valid on
    pub chain_id: u64,
    /// Contract that consumes the signature
    pub verifying_contract: Address,
}

impl DomainSeparator {
    /// Create a new domain separator.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id,
            verifying_contract,
        }
    }

    /// Compute the domain separator hash.
    ///
    /// Recomputed on every call; never cache it across chain forks.
    pub fn hash(&self) -> Hash {
        let mut enc = StructEncoder::new(DOMAIN_TYPE);
        enc.push_string(&self.name);
        enc.push_string(&self.version);
        enc.push_u64(self.chain_id);
        enc.push_address(&self.verifying_contract);
        enc.finish().0
    }
}

/// Cross-contract policy for a requested signing domain.
///
/// Name, version and chain must always match, so a version bump retires every
/// signature made under the old version. The contract must match `expected`
/// unless it is on `allowed_contracts`.
pub fn check_domain(
    requested: &DomainSeparator,
    expected: &DomainSeparator,
    allowed_contracts: &[Address],
) -> Result<(), AuthError> {
    if requested.name != expected.name {
        return Err(AuthError::DomainMismatch("name"));
    }
    if requested.version != expected.version {
        return Err(AuthError::DomainMismatch("version"));
    }
    if requested.chain_id != expected.chain_id {
        return Err(AuthError::DomainMismatch("chain id"));
    }
    if requested.verifying_contract != expected.verifying_contract
        && !allowed_contracts.contains(&requested.verifying_contract)
    {
        return Err(AuthError::DomainMismatch("verifying contract"));
    }
    Ok(())
}

// =============================================================================
// DIGEST TYPES
// =============================================================================

/// Hash of a typed struct (`keccak256(typeHash || fields)`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructHash(Hash);

impl StructHash {
    /// Wrap a struct hash computed by a trusted upstream encoder.
    pub fn from_bytes(bytes: Hash) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }
}

/// Final domain-bound digest that signatures are made over.
///
/// Only [`typed_data_digest`] produces one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypedDigest(Hash);

impl TypedDigest {
    /// Raw bytes.
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn from_raw(bytes: Hash) -> Self {
        Self(bytes)
    }
}

/// Compute the final digest: `keccak256(0x19 || 0x01 || domainSeparator || structHash)`.
pub fn typed_data_digest(domain: &DomainSeparator, struct_hash: &StructHash) -> TypedDigest {
    TypedDigest(keccak256_words(&[
        &[0x19, 0x01],
        &domain.hash(),
        struct_hash.as_bytes(),
    ]))
}

// =============================================================================
// STRUCT ENCODER
// =============================================================================

/// Encoder for typed struct fields.
///
/// Every push appends exactly one 32-byte word.
pub struct StructEncoder {
    buf: Vec<u8>,
}

impl StructEncoder {
    /// Start a struct; the type hash is always the first word.
    pub fn new(type_string: &str) -> Self {
        let mut buf = Vec::with_capacity(32 * 8);
        buf.extend_from_slice(&keccak256(type_string.as_bytes()));
        Self { buf }
    }

    /// Append a `bytes32` field.
    pub fn push_word(&mut self, word: &Hash) -> &mut Self {
        self.buf.extend_from_slice(word);
        self
    }

    /// Append a `uint256` field from a 64-bit value.
    pub fn push_u64(&mut self, value: u64) -> &mut Self {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&value.to_be_bytes());
        self.push_word(&word)
    }

    /// Append a `uint256` field from a 128-bit value.
    pub fn push_u128(&mut self, value: u128) -> &mut Self {
        let mut word = [0u8; 32];
        word[16..].copy_from_slice(&value.to_be_bytes());
        self.push_word(&word)
    }

    /// Append an `address` field (left-padded to 32 bytes).
    pub fn push_address(&mut self, address: &Address) -> &mut Self {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(address);
        self.push_word(&word)
    }

    /// Append a `bool` field.
    pub fn push_bool(&mut self, value: bool) -> &mut Self {
        self.push_u64(value as u64)
    }

    /// Append a `string` field (hashed to one word).
    pub fn push_string(&mut self, value: &str) -> &mut Self {
        self.push_bytes(value.as_bytes())
    }

    /// Append a `bytes` field (hashed to one word).
    pub fn push_bytes(&mut self, value: &[u8]) -> &mut Self {
        let word = keccak256(value);
        self.push_word(&word)
    }

    /// Append a nested struct field.
    pub fn push_struct(&mut self, nested: &StructHash) -> &mut Self {
        self.push_word(nested.as_bytes())
    }

    /// Finish and hash the encoded struct.
    pub fn finish(&self) -> StructHash {
        StructHash(keccak256(&self.buf))
    }
}
