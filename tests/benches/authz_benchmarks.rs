//! # Authorization Core Benchmarks
//!
//! | Component | Benchmark group |
//! |-----------|-----------------|
//! | ECDSA recovery guard | `authz/ecdsa` |
//! | FROST verifier | `authz/frost` |
//! | Lamport verifier | `authz/lamport` |
//! | Full authorization | `authz/authorize` |
//! | Merkle verifier | `authz/merkle` |

use authz_tests::benchmarks::authz::{
    bench_authorize, bench_ecdsa_recover, bench_frost_verify, bench_lamport_verify,
    bench_merkle_verify,
};
use criterion::{criterion_group, criterion_main};

criterion_group!(
    benches,
    bench_ecdsa_recover,
    bench_frost_verify,
    bench_lamport_verify,
    bench_authorize,
    bench_merkle_verify
);
criterion_main!(benches);
