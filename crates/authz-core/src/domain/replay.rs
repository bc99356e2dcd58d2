//! # Nonce / Replay Registry
//!
//! Per-principal monotonic counters and an idempotent consumed-set.
//!
//! Consumption is split in two explicit steps:
//!
//! 1. [`check_nonce`] is a pure comparison producing a [`NonceAdvance`] token.
//! 2. [`StateTxn::commit_nonce`] applies the token.
//!
//! Nothing mutates during the comparison, so a rejected request can never move
//! a counter. Both steps run inside one [`StateTxn`]; the store applies the
//! staged writes only if the whole transaction succeeds.

use super::entities::{Address, Hash, LamportAccount, Principal, StateDelta};
use super::errors::AuthError;
use super::hasher::TypedDigest;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// =============================================================================
// REPLAY KEYS
// =============================================================================

/// Consumed-set key for content-addressed flows.
///
/// Only constructible from a [`TypedDigest`], i.e. from canonical message
/// fields. Malleable variants of one signature map to the same key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplayKey(Hash);

impl ReplayKey {
    /// Raw key bytes.
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }
}

impl From<&TypedDigest> for ReplayKey {
    fn from(digest: &TypedDigest) -> Self {
        Self(*digest.as_bytes())
    }
}

// =============================================================================
// STATE VIEW AND TRANSACTIONS
// =============================================================================

/// Read access to committed registry state.
pub trait StateView {
    /// Current counter for `principal` (0 if never referenced).
    fn nonce(&self, principal: &Principal) -> Result<u64, AuthError>;

    /// Whether `key` has been consumed.
    fn is_consumed(&self, key: &ReplayKey) -> Result<bool, AuthError>;

    /// Lamport state for `account`, if enrolled.
    fn lamport(&self, account: &Address) -> Result<Option<LamportAccount>, AuthError>;
}

/// Writes staged by a transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteSet {
    /// New counter values
    pub nonces: HashMap<Principal, u64>,
    /// Newly consumed keys
    pub consumed: HashSet<ReplayKey>,
    /// New Lamport states
    pub lamport: HashMap<Address, LamportAccount>,
}

impl WriteSet {
    /// True if nothing was staged.
    pub fn is_empty(&self) -> bool {
        self.nonces.is_empty() && self.consumed.is_empty() && self.lamport.is_empty()
    }
}

/// Transaction over a consistent [`StateView`].
///
/// Reads see staged writes first. Writes are only staged; the owning store
/// applies them after the transaction closure returns `Ok`.
pub struct StateTxn<'a> {
    view: &'a dyn StateView,
    writes: WriteSet,
}

impl<'a> StateTxn<'a> {
    /// Start a transaction over `view`.
    pub fn new(view: &'a dyn StateView) -> Self {
        Self {
            view,
            writes: WriteSet::default(),
        }
    }

    /// Current counter for `principal`.
    pub fn nonce(&self, principal: &Principal) -> Result<u64, AuthError> {
        match self.writes.nonces.get(principal) {
            Some(n) => Ok(*n),
            None => self.view.nonce(principal),
        }
    }

    /// Whether `key` has been consumed.
    pub fn is_consumed(&self, key: &ReplayKey) -> Result<bool, AuthError> {
        if self.writes.consumed.contains(key) {
            return Ok(true);
        }
        self.view.is_consumed(key)
    }

    /// Lamport state for `account`.
    pub fn lamport(&self, account: &Address) -> Result<Option<LamportAccount>, AuthError> {
        match self.writes.lamport.get(account) {
            Some(state) => Ok(Some(*state)),
            None => self.view.lamport(account),
        }
    }

    /// Apply an accepted nonce check.
    ///
    /// Re-validates the token against the transaction's view, so a token
    /// cannot be replayed or applied to a moved counter.
    pub fn commit_nonce(&mut self, advance: NonceAdvance) -> Result<StateDelta, AuthError> {
        let stored = self.nonce(&advance.principal)?;
        if stored != advance.from {
            return Err(AuthError::StaleOrReusedNonce {
                expected: stored,
                supplied: advance.from,
            });
        }
        self.writes.nonces.insert(advance.principal, advance.to);
        Ok(StateDelta::NonceAdvanced {
            principal: advance.principal,
            new_nonce: advance.to,
        })
    }

    /// Stage insertion of a consumed key.
    pub(crate) fn stage_consumed(&mut self, key: ReplayKey) {
        self.writes.consumed.insert(key);
    }

    /// Stage a new Lamport state.
    pub(crate) fn stage_lamport(&mut self, account: Address, state: LamportAccount) {
        self.writes.lamport.insert(account, state);
    }

    /// Finish the transaction, yielding the staged writes.
    pub fn into_writes(self) -> WriteSet {
        self.writes
    }
}

// =============================================================================
// NONCE REGISTRY
// =============================================================================

/// Proof that a nonce check passed. Only [`check_nonce`] creates one.
#[derive(Debug, PartialEq, Eq)]
pub struct NonceAdvance {
    principal: Principal,
    from: u64,
    to: u64,
}

impl NonceAdvance {
    /// Counter value after the advance.
    pub fn next(&self) -> u64 {
        self.to
    }
}

/// Pure check: accept iff `supplied == stored`.
pub fn check_nonce(
    principal: Principal,
    stored: u64,
    supplied: u64,
) -> Result<NonceAdvance, AuthError> {
    if supplied != stored {
        return Err(AuthError::StaleOrReusedNonce {
            expected: stored,
            supplied,
        });
    }
    let to = stored
        .checked_add(1)
        .ok_or(AuthError::InvariantViolation("nonce counter exhausted"))?;
    Ok(NonceAdvance {
        principal,
        from: stored,
        to,
    })
}

/// Check then commit `supplied` for `principal` inside `txn`.
pub fn consume(
    txn: &mut StateTxn<'_>,
    principal: Principal,
    supplied: u64,
) -> Result<StateDelta, AuthError> {
    let stored = txn.nonce(&principal)?;
    let advance = check_nonce(principal, stored, supplied)?;
    txn.commit_nonce(advance)
}

/// Mark a content-addressed message consumed; fails if it already was.
pub fn consume_digest(txn: &mut StateTxn<'_>, key: ReplayKey) -> Result<StateDelta, AuthError> {
    if txn.is_consumed(&key)? {
        return Err(AuthError::DigestAlreadyConsumed);
    }
    txn.stage_consumed(key);
    Ok(StateDelta::DigestConsumed { key })
}
