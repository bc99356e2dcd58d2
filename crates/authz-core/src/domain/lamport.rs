//! # Lamport One-Time Verifier & Rotation
//!
//! A one-time key is 256 preimage pairs. Its public commitment is
//!
//! ```text
//! pkh = keccak256(pub[0][0] || pub[0][1] || ... || pub[255][1]),  pub[i][b] = keccak256(pre[i][b])
//! ```
//!
//! Each signature reveals one preimage per bit of the rotation digest and
//! carries `next_pkh`, the commitment to the successor key. The rotation
//! digest binds the call digest, `next_pkh` and the rotation counter under the
//! consuming contract's domain separator.
//!
//! [`LamportVerifier::verify_and_rotate`] only ever reports acceptance after it
//! has staged the new commitment in the same transaction.

use super::entities::{
    Address, Hash, LamportAccount, LamportPublicKey, LamportSignature, Principal, StateDelta,
    LAMPORT_BITS,
};
use super::errors::AuthError;
use super::hasher::{
    keccak256, keccak256_words, typed_data_digest, DomainSeparator, StructEncoder, TypedDigest,
};
use super::replay::StateTxn;
use rand::{CryptoRng, RngCore};
use sha3::{Digest, Keccak256};
use subtle::{Choice, ConstantTimeEq};
use tracing::debug;
use zeroize::Zeroize;

/// Struct type bound into every rotation digest.
pub const LAMPORT_ROTATION_TYPE: &str =
    "LamportRotation(bytes32 payload,bytes32 nextPkh,uint256 counter)";

/// Tag separating Lamport principals from recovered key addresses.
pub const LAMPORT_PRINCIPAL_TAG: &[u8] = b"authz.lamport.principal.v1";

/// Principal authenticated by a Lamport account.
///
/// Enrollment is unauthenticated, so the account label is never itself a
/// principal: the last 20 bytes of `keccak256(tag || account)` live outside
/// the space of addresses derived from public keys.
pub fn lamport_principal(account: &Address) -> Principal {
    let hash = keccak256_words(&[LAMPORT_PRINCIPAL_TAG, account]);
    let mut principal = [0u8; 20];
    principal.copy_from_slice(&hash[12..]);
    principal
}

// =============================================================================
// KEYS
// =============================================================================

/// Commitment over a public key: keccak256 of all public halves in order.
pub fn commitment(public_key: &LamportPublicKey) -> Hash {
    let mut hasher = Keccak256::new();
    for [zero, one] in public_key.halves() {
        hasher.update(zero);
        hasher.update(one);
    }
    hasher.finalize().into()
}

/// One-time key pair. Signing consumes it.
pub struct LamportKeyPair {
    secret: Vec<[Hash; 2]>,
    public: LamportPublicKey,
}

impl LamportKeyPair {
    /// Generate a fresh key pair.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, AuthError> {
        let mut secret = vec![[[0u8; 32]; 2]; LAMPORT_BITS];
        for pair in secret.iter_mut() {
            rng.fill_bytes(&mut pair[0]);
            rng.fill_bytes(&mut pair[1]);
        }
        let halves = secret
            .iter()
            .map(|[zero, one]| [keccak256(zero), keccak256(one)])
            .collect();

        Ok(Self {
            secret,
            public: LamportPublicKey::from_halves(halves)?,
        })
    }

    /// Public key.
    pub fn public_key(&self) -> &LamportPublicKey {
        &self.public
    }

    /// Commitment (`pkh`) to this key.
    pub fn commitment(&self) -> Hash {
        commitment(&self.public)
    }

    /// Sign `digest`, revealing one preimage per bit. Consumes the key.
    pub fn sign(self, digest: &Hash, next_pkh: Hash) -> LamportSignature {
        let preimages = (0..LAMPORT_BITS)
            .map(|i| self.secret[i][bit_at(digest, i) as usize])
            .collect();

        LamportSignature {
            preimages,
            public_key: self.public.clone(),
            next_pkh,
        }
    }
}

impl Drop for LamportKeyPair {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

// =============================================================================
// VERIFICATION
// =============================================================================

/// Bit `index` of `digest`, most significant bit of byte 0 first.
pub fn bit_at(digest: &Hash, index: usize) -> u8 {
    (digest[index / 8] >> (7 - (index % 8))) & 1
}

/// Digest a Lamport key signs for one rotation.
pub fn rotation_digest(
    domain: &DomainSeparator,
    payload: &TypedDigest,
    next_pkh: &Hash,
    counter: u64,
) -> Hash {
    let struct_hash = StructEncoder::new(LAMPORT_ROTATION_TYPE)
        .push_word(payload.as_bytes())
        .push_word(next_pkh)
        .push_u64(counter)
        .finish();
    *typed_data_digest(domain, &struct_hash).as_bytes()
}

/// Check every revealed preimage against the half selected by its digest bit.
///
/// Evaluates all 256 positions before answering.
pub fn verify_reveal(digest: &Hash, signature: &LamportSignature) -> bool {
    if signature.preimages.len() != LAMPORT_BITS
        || signature.public_key.halves().len() != LAMPORT_BITS
    {
        return false;
    }
    let mut ok = Choice::from(1u8);
    for (i, preimage) in signature.preimages.iter().enumerate() {
        ok &= match signature.public_key.half(i, bit_at(digest, i)) {
            Some(expected) => keccak256(preimage).ct_eq(expected),
            None => Choice::from(0u8),
        };
    }
    ok.into()
}

/// Stateless verification against `current_pkh`.
pub fn verify(
    digest: &Hash,
    signature: &LamportSignature,
    current_pkh: &Hash,
) -> Result<(), AuthError> {
    let revealed: bool = commitment(&signature.public_key).ct_eq(current_pkh).into();
    if !revealed {
        return Err(AuthError::StaleCommitment);
    }
    if signature.next_pkh == [0u8; 32] || &signature.next_pkh == current_pkh {
        return Err(AuthError::MalformedInput("next_pkh must be a fresh commitment"));
    }
    if !verify_reveal(digest, signature) {
        return Err(AuthError::InvalidSignature);
    }
    Ok(())
}

/// Stateful verifier bound to the consuming contract's domain.
#[derive(Clone, Debug)]
pub struct LamportVerifier {
    domain: DomainSeparator,
}

impl LamportVerifier {
    /// Create a verifier for signatures consumed under `domain`.
    pub fn new(domain: DomainSeparator) -> Self {
        Self { domain }
    }

    /// Record the first commitment for `account`.
    pub fn enroll(
        &self,
        txn: &mut StateTxn<'_>,
        account: Address,
        pkh: Hash,
    ) -> Result<LamportAccount, AuthError> {
        if txn.lamport(&account)?.is_some() {
            return Err(AuthError::AlreadyEnrolled);
        }
        if pkh == [0u8; 32] {
            return Err(AuthError::InvalidKeyMaterial("zero lamport commitment"));
        }
        let state = LamportAccount { pkh, counter: 0 };
        txn.stage_lamport(account, state);
        Ok(state)
    }

    /// Verify a reveal over `payload` and rotate the commitment in `txn`.
    pub fn verify_and_rotate(
        &self,
        txn: &mut StateTxn<'_>,
        account: Address,
        payload: &TypedDigest,
        signature: &LamportSignature,
    ) -> Result<StateDelta, AuthError> {
        let current = txn.lamport(&account)?.ok_or(AuthError::NotEnrolled)?;
        let digest = rotation_digest(&self.domain, payload, &signature.next_pkh, current.counter);

        verify(&digest, signature, &current.pkh)?;

        let rotated = LamportAccount {
            pkh: signature.next_pkh,
            counter: current
                .counter
                .checked_add(1)
                .ok_or(AuthError::InvariantViolation("lamport counter exhausted"))?,
        };
        txn.stage_lamport(account, rotated);
        debug!(counter = rotated.counter, "[authz] lamport commitment rotated");

        Ok(StateDelta::CommitmentRotated {
            account,
            new_pkh: rotated.pkh,
            counter: rotated.counter,
        })
    }
}
