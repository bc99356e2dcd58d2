//! # Merkle Commitment Verifier
//!
//! Inclusion proofs with distinct leaf and node prefixes:
//!
//! ```text
//! leaf = keccak256(0x00 || data)
//! node = keccak256(0x01 || left || right)
//! ```
//!
//! A 64-byte leaf whose bytes equal some node's `left || right` therefore
//! hashes differently from that node, and cannot stand in for a subtree.
//!
//! Bit `i` of `path_bits` is 1 when the running node is the right child of
//! the hash with `siblings[i]`.
//!
//! An unpaired node at the end of a level is carried up unchanged, so
//! `[a, b, c]` and `[a, b, c, c]` commit to different roots.

use super::entities::Hash;
use super::errors::AuthError;
use super::hasher::keccak256_words;
use serde::{Deserialize, Serialize};

/// Deepest proof accepted (one path bit per level).
pub const MAX_DEPTH: usize = 64;

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// Sibling path plus direction bits for one leaf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Sibling hashes from the leaf level upward
    pub siblings: Vec<Hash>,
    /// Direction bits, least significant bit first
    pub path_bits: u64,
}

/// Hash raw leaf data.
pub fn hash_leaf(data: &[u8]) -> Hash {
    keccak256_words(&[&[LEAF_PREFIX], data])
}

/// Hash two children.
pub fn hash_node(left: &Hash, right: &Hash) -> Hash {
    keccak256_words(&[&[NODE_PREFIX], left, right])
}

/// Verify that `leaf` is committed under `root`.
///
/// Never errors: malformed proofs are simply `false`.
pub fn verify(leaf: &[u8], siblings: &[Hash], path_bits: u64, root: &Hash) -> bool {
    let depth = siblings.len();
    if depth > MAX_DEPTH {
        return false;
    }
    if depth < MAX_DEPTH && path_bits >> depth != 0 {
        return false;
    }

    let mut current = hash_leaf(leaf);
    for (level, sibling) in siblings.iter().enumerate() {
        current = if (path_bits >> level) & 1 == 1 {
            hash_node(sibling, &current)
        } else {
            hash_node(&current, sibling)
        };
    }

    current == *root
}

/// Verify a [`MerkleProof`].
pub fn verify_proof(leaf: &[u8], proof: &MerkleProof, root: &Hash) -> bool {
    verify(leaf, &proof.siblings, proof.path_bits, root)
}

/// Root over `leaves`. An unpaired last node is promoted unchanged.
///
/// Returns the zero hash for an empty set.
pub fn compute_root<T: AsRef<[u8]>>(leaves: &[T]) -> Hash {
    if leaves.is_empty() {
        return [0u8; 32];
    }
    let mut level: Vec<Hash> = leaves.iter().map(|l| hash_leaf(l.as_ref())).collect();
    while level.len() > 1 {
        level = next_level(&level);
    }
    level[0]
}

/// Proof for the leaf at `index`.
pub fn build_proof<T: AsRef<[u8]>>(leaves: &[T], index: usize) -> Result<MerkleProof, AuthError> {
    if index >= leaves.len() {
        return Err(AuthError::MalformedInput("leaf index out of range"));
    }

    let mut level: Vec<Hash> = leaves.iter().map(|l| hash_leaf(l.as_ref())).collect();
    let mut index = index;
    let mut siblings = Vec::new();
    let mut path_bits = 0u64;

    while level.len() > 1 {
        if siblings.len() == MAX_DEPTH {
            return Err(AuthError::MalformedInput("tree deeper than 64 levels"));
        }
        let is_right = index % 2 == 1;
        let sibling = if is_right {
            Some(level[index - 1])
        } else {
            level.get(index + 1).copied()
        };
        // No sibling: promoted, nothing to record at this level.
        if let Some(sibling) = sibling {
            if is_right {
                path_bits |= 1 << siblings.len();
            }
            siblings.push(sibling);
        }

        level = next_level(&level);
        index /= 2;
    }

    Ok(MerkleProof {
        siblings,
        path_bits,
    })
}

fn next_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|pair| match pair.get(1) {
            Some(right) => hash_node(&pair[0], right),
            None => pair[0],
        })
        .collect()
}
