//! In-memory FROST group-key store.

use crate::domain::entities::{FrostPublicKey, GroupId};
use crate::domain::errors::AuthError;
use crate::domain::frost::FrostVerifier;
use crate::ports::outbound::KeyStore;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Group keys provisioned out of band, validated on the way in.
pub struct InMemoryKeyStore {
    keys: RwLock<HashMap<GroupId, FrostPublicKey>>,
    verifier: FrostVerifier,
}

impl InMemoryKeyStore {
    /// Create an empty store validating keys with `verifier`'s policy.
    pub fn new(verifier: FrostVerifier) -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
            verifier,
        }
    }

    /// Register (or replace) the key for `group`.
    ///
    /// Keys rejected by the policy never enter the store.
    pub fn register_group_key(&self, group: GroupId, key: FrostPublicKey) -> Result<(), AuthError> {
        if !self.verifier.is_valid_public_key(&key) {
            warn!(policy = ?self.verifier.policy(), "[authz] refused FROST group key");
            return Err(AuthError::InvalidKeyMaterial("frost group key rejected by policy"));
        }
        self.keys.write().insert(group, key);
        debug!("[authz] registered FROST group key {}", hex::encode(group));
        Ok(())
    }

    /// Number of registered groups.
    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    /// True if no group is registered.
    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }
}

impl Default for InMemoryKeyStore {
    fn default() -> Self {
        Self::new(FrostVerifier::default())
    }
}

impl KeyStore for InMemoryKeyStore {
    fn frost_group_key(&self, group: &GroupId) -> Result<Option<FrostPublicKey>, AuthError> {
        Ok(self.keys.read().get(group).copied())
    }
}
