//! # Adapters Module
//!
//! In-memory implementations of the outbound ports.

pub mod key_store;
pub mod memory_store;

pub use key_store::InMemoryKeyStore;
pub use memory_store::InMemoryReplayStore;
