//! The process-wide access-key table.
//!
//! Maps access key IDs to secret keys. Lookups greatly outnumber updates, so
//! the table lives behind a readers/writer lock. [`KeyStore::store`] merges
//! new pairs in; [`KeyStore::reload`] replaces the whole set atomically,
//! which is how key revocation works.

use std::collections::HashMap;
use std::sync::RwLock;

/// Access-key to secret-key mapping consulted by the signature verifier.
///
/// An empty store disables authentication entirely: the middleware bypasses
/// verification when no keys are registered.
#[derive(Debug, Default)]
pub struct KeyStore {
    keys: RwLock<HashMap<String, String>>,
}

impl KeyStore {
    /// Create a store preloaded with the given pairs.
    #[must_use]
    pub fn new(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            keys: RwLock::new(pairs.into_iter().collect()),
        }
    }

    /// Merge the given pairs into the store, overwriting existing entries.
    pub fn store(&self, pairs: impl IntoIterator<Item = (String, String)>) {
        let mut keys = self.keys.write().expect("key store lock poisoned");
        keys.extend(pairs);
    }

    /// Replace the full key set atomically.
    pub fn reload(&self, pairs: impl IntoIterator<Item = (String, String)>) {
        let mut keys = self.keys.write().expect("key store lock poisoned");
        *keys = pairs.into_iter().collect();
    }

    /// Look up the secret key for an access key ID.
    #[must_use]
    pub fn secret_key(&self, access_key_id: &str) -> Option<String> {
        let keys = self.keys.read().expect("key store lock poisoned");
        keys.get(access_key_id).cloned()
    }

    /// Whether any keys are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let keys = self.keys.read().expect("key store lock poisoned");
        keys.is_empty()
    }

    /// Number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        let keys = self.keys.read().expect("key store lock poisoned");
        keys.len()
    }
}
