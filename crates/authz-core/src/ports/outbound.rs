//! # Outbound Ports (Driven Ports / SPI)
//!
//! Traits that define dependencies the authorization core needs.

use crate::domain::entities::{FrostPublicKey, GroupId};
use crate::domain::errors::AuthError;
use crate::domain::replay::StateTxn;

/// Read-only source of provisioned FROST group keys.
pub trait KeyStore: Send + Sync {
    /// Group key registered under `group`, if any.
    fn frost_group_key(&self, group: &GroupId) -> Result<Option<FrostPublicKey>, AuthError>;
}

/// Durable home of nonce counters, the consumed-set and Lamport state.
///
/// Passed to the service by handle; nothing in the core holds global state.
pub trait ReplayStore: Send + Sync {
    /// Run `f` over a consistent snapshot and apply its staged writes iff it
    /// returns `Ok`.
    ///
    /// Concurrent transactions must be serializable: two callers racing on the
    /// same principal never both observe the same counter.
    fn atomically<T, F>(&self, f: F) -> Result<T, AuthError>
    where
        F: FnOnce(&mut StateTxn<'_>) -> Result<T, AuthError>;
}
