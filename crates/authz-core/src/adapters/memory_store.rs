//! In-memory replay store.
//!
//! Transactions are serialized by one `parking_lot::Mutex`; the closure runs
//! against the locked state and its writes are applied before the lock drops.

use crate::domain::entities::{Address, LamportAccount, Principal};
use crate::domain::errors::AuthError;
use crate::domain::replay::{ReplayKey, StateTxn, StateView, WriteSet};
use crate::ports::outbound::ReplayStore;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tracing::error;

#[derive(Debug, Default)]
struct MemoryState {
    nonces: HashMap<Principal, u64>,
    consumed: HashSet<ReplayKey>,
    lamport: HashMap<Address, LamportAccount>,
}

impl StateView for MemoryState {
    fn nonce(&self, principal: &Principal) -> Result<u64, AuthError> {
        Ok(self.nonces.get(principal).copied().unwrap_or(0))
    }

    fn is_consumed(&self, key: &ReplayKey) -> Result<bool, AuthError> {
        Ok(self.consumed.contains(key))
    }

    fn lamport(&self, account: &Address) -> Result<Option<LamportAccount>, AuthError> {
        Ok(self.lamport.get(account).copied())
    }
}

impl MemoryState {
    /// Reject any write that would move state backwards.
    fn check(&self, writes: &WriteSet) -> Result<(), AuthError> {
        for (principal, next) in &writes.nonces {
            if *next <= self.nonce(principal)? {
                return Err(AuthError::InvariantViolation("nonce must strictly increase"));
            }
        }
        for (account, next) in &writes.lamport {
            if let Some(current) = self.lamport.get(account) {
                if next.counter <= current.counter {
                    return Err(AuthError::InvariantViolation(
                        "lamport counter must strictly increase",
                    ));
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, writes: WriteSet) {
        self.nonces.extend(writes.nonces);
        self.consumed.extend(writes.consumed);
        self.lamport.extend(writes.lamport);
    }
}

/// In-memory implementation of [`ReplayStore`].
#[derive(Debug, Default)]
pub struct InMemoryReplayStore {
    state: Mutex<MemoryState>,
}

impl InMemoryReplayStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of consumed content-addressed keys.
    pub fn consumed_count(&self) -> usize {
        self.state.lock().consumed.len()
    }
}

impl ReplayStore for InMemoryReplayStore {
    fn atomically<T, F>(&self, f: F) -> Result<T, AuthError>
    where
        F: FnOnce(&mut StateTxn<'_>) -> Result<T, AuthError>,
    {
        let mut state = self.state.lock();

        let (value, writes) = {
            let mut txn = StateTxn::new(&*state);
            let value = f(&mut txn)?;
            (value, txn.into_writes())
        };

        if let Err(e) = state.check(&writes) {
            error!("[authz] rejected replay-store write: {}", e);
            return Err(e);
        }
        state.apply(writes);
        Ok(value)
    }
}
