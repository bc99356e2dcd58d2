//! # Authorization Core Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Criterion benchmark bodies
//! ├── exploits/         # Attack simulations against the public API
//! ├── integration/      # End-to-end authorization flows
//! └── fixtures.rs       # Signers, services and tracing setup
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p authz-tests
//!
//! # By category
//! cargo test -p authz-tests integration::
//! cargo test -p authz-tests exploits::
//!
//! # Benchmarks
//! cargo bench -p authz-tests
//! ```

#![allow(dead_code)]

pub mod benchmarks;
pub mod fixtures;
pub mod integration;
