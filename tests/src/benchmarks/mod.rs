//! # Authorization Benchmarks
//!
//! Criterion benchmark bodies, wired up in `benches/authz_benchmarks.rs`.

pub mod authz;
