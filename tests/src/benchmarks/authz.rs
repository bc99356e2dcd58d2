//! # Authorization Benchmarks
//!
//! - Single ECDSA recovery through the guard
//! - Batch recovery, sequential vs rayon
//! - FROST verification
//! - Lamport verification (256 hashes + commitment)
//! - Full `authorize` round trip with the in-memory stores
//! - Merkle verification at growing depth

use crate::fixtures::{ecdsa_request, service, withdraw};
use authz_core::domain::ecdsa::recover;
use authz_core::domain::ecdsa::test_helpers::{
    create_valid_verification_request, generate_keypair, sign,
};
use authz_core::domain::frost::test_helpers::{random_scalar, sign as frost_sign};
use authz_core::domain::lamport;
use authz_core::domain::merkle;
use authz_core::{
    keccak256, AuthorizationApi, EcdsaVerifier, FrostVerifier, LamportKeyPair, ReplayProtection,
};
use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

pub fn bench_ecdsa_recover(c: &mut Criterion) {
    let mut group = c.benchmark_group("authz/ecdsa");
    let (sk, _) = generate_keypair();
    let digest = keccak256(b"bench");
    let sig = sign(&digest, &sk);

    group.bench_function("recover_single", |b| {
        b.iter(|| black_box(recover(black_box(&digest), black_box(&sig))))
    });

    for size in [16usize, 128, 1024] {
        let requests: Vec<_> = (0..size)
            .map(|_| create_valid_verification_request())
            .collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("batch_sequential", size), &requests, |b, r| {
            let verifier = EcdsaVerifier::new(usize::MAX);
            b.iter(|| black_box(verifier.batch_recover(r)))
        });
        group.bench_with_input(BenchmarkId::new("batch_parallel", size), &requests, |b, r| {
            let verifier = EcdsaVerifier::new(1);
            b.iter(|| black_box(verifier.batch_recover(r)))
        });
    }
    group.finish();
}

pub fn bench_frost_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("authz/frost");
    let message = keccak256(b"frost bench");
    let (key, sig) = frost_sign(&random_scalar(), &message);
    let verifier = FrostVerifier::default();

    group.bench_function("verify", |b| {
        b.iter(|| black_box(verifier.verify(&key, black_box(&message), &sig)))
    });
    group.finish();
}

pub fn bench_lamport_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("authz/lamport");
    let mut rng = rand::thread_rng();
    let key = LamportKeyPair::generate(&mut rng).expect("keygen");
    let pkh = key.commitment();
    let next = LamportKeyPair::generate(&mut rng).expect("keygen").commitment();
    let digest = keccak256(b"lamport bench");
    let sig = key.sign(&digest, next);

    group.bench_function("verify", |b| {
        b.iter(|| black_box(lamport::verify(black_box(&digest), &sig, &pkh)))
    });
    group.bench_function("keygen", |b| {
        b.iter(|| black_box(LamportKeyPair::generate(&mut rand::thread_rng())))
    });
    group.finish();
}

pub fn bench_authorize(c: &mut Criterion) {
    let mut group = c.benchmark_group("authz/authorize");
    group.measurement_time(Duration::from_secs(10));
    let service = service();
    let domain = service.config().domain.clone();
    let (sk, _) = generate_keypair();
    let mut nonce = 0u64;

    group.bench_function("ecdsa_sequential", |b| {
        b.iter_batched(
            || {
                let request = ecdsa_request(
                    &sk,
                    &domain,
                    withdraw([0x01; 20], nonce, "bench"),
                    ReplayProtection::Sequential { nonce },
                );
                nonce += 1;
                request
            },
            |request| black_box(service.authorize(&request)),
            criterion::BatchSize::SmallInput,
        )
    });
    group.finish();
}

pub fn bench_merkle_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("authz/merkle");
    for leaves in [16usize, 1024, 65536] {
        let set: Vec<[u8; 8]> = (0..leaves as u64).map(u64::to_be_bytes).collect();
        let root = merkle::compute_root(&set);
        let proof = merkle::build_proof(&set, leaves / 2).expect("in range");
        group.bench_with_input(BenchmarkId::new("verify", leaves), &proof, |b, p| {
            b.iter(|| black_box(merkle::verify_proof(&set[leaves / 2], p, &root)))
        });
    }
    group.finish();
}
