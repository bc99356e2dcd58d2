//! Fuzz target for Merkle proof verification.

#![no_main]

use authz_core::domain::merkle::{build_proof, compute_root, verify};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, arbitrary::Arbitrary)]
struct FuzzInput {
    leaves: Vec<Vec<u8>>,
    index: usize,
    siblings: Vec<[u8; 32]>,
    path_bits: u64,
    root: [u8; 32],
    leaf: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    // Arbitrary proofs never panic.
    let _ = verify(&input.leaf, &input.siblings, input.path_bits, &input.root);

    // Honest proofs always verify.
    if !input.leaves.is_empty() {
        let index = input.index % input.leaves.len();
        let root = compute_root(&input.leaves);
        if let Ok(proof) = build_proof(&input.leaves, index) {
            assert!(verify(&input.leaves[index], &proof.siblings, proof.path_bits, &root));
        }
    }
});
