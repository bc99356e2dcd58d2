//! # Authorization Core
//!
//! Signature authorization for contract calls: authenticate a signed message
//! under one of three schemes, bind it to one signing domain, and consume it
//! exactly once.
//!
//! **Architecture:** Hexagonal (domain + ports/adapters)
//!
//! ## Components
//!
//! | Component | Module |
//! |-----------|--------|
//! | ECDSA recovery guard (EIP-2 low-S, zero-address rejection) | [`domain::ecdsa`] |
//! | FROST Schnorr verifier over secp256k1 | [`domain::frost`] |
//! | Lamport one-time signatures with commitment rotation | [`domain::lamport`] |
//! | Nonce / replay registry | [`domain::replay`] |
//! | EIP-712 style domain-separated hasher | [`domain::hasher`] |
//! | Domain-separated Merkle verifier | [`domain::merkle`] |
//!
//! ## Flow
//!
//! ```text
//! request ──► Hasher ──► SchemeVerifier ──► Replay registry ──► Authorization
//!                          └──────── one ReplayStore transaction ────────┘
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! authz-core/
//! ├── domain/          # Verifiers, hasher, registry logic, errors
//! ├── ports/           # AuthorizationApi (inbound), KeyStore + ReplayStore (outbound)
//! ├── adapters/        # In-memory key and replay stores
//! ├── service.rs       # AuthorizationService
//! └── config.rs        # AuthorizationConfig
//! ```
//!
//! ## Security Notes
//!
//! - High-S ECDSA signatures are rejected before any other check
//! - Replay keys are derived from canonical digests, never from signature bytes
//! - Registry state changes only together with an accepted signature

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::{InMemoryKeyStore, InMemoryReplayStore};
pub use config::{AuthorizationConfig, ConfigError};
pub use domain::ecdsa::{address_from_pubkey, EcdsaVerifier};
pub use domain::entities::{
    Address, Authorization, AuthorizationRequest, BatchVerificationResult, EcdsaSignature,
    FrostPublicKey, FrostSignature, GroupId, Hash, LamportAccount, LamportPublicKey,
    LamportSignature, Principal, RawSignature, ReplayProtection, SchemeTag, SignatureRecord,
    StateDelta, VerificationRequest, VerificationResult,
};
pub use domain::errors::AuthError;
pub use domain::frost::{group_address, FrostVerifier, KeyPolicy, TranscriptVersion};
pub use domain::hasher::{
    keccak256, typed_data_digest, DomainSeparator, StructEncoder, StructHash, TypedDigest,
};
pub use domain::lamport::{lamport_principal, rotation_digest, LamportKeyPair, LamportVerifier};
pub use domain::merkle::MerkleProof;
pub use domain::replay::ReplayKey;
pub use domain::scheme::SchemeVerifier;
pub use ports::inbound::AuthorizationApi;
pub use ports::outbound::{KeyStore, ReplayStore};
pub use service::AuthorizationService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
