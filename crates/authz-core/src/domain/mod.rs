//! # Domain Layer
//!
//! Pure cryptographic logic with no I/O dependencies.
//! This is the inner layer of the hexagonal architecture.

pub mod ecdsa;
pub mod entities;
pub mod errors;
pub mod frost;
pub mod hasher;
pub mod lamport;
pub mod merkle;
pub mod replay;
pub mod scheme;
