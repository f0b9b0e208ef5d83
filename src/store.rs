//! Backing-store abstraction consumed by the seeder and workload runner.
//!
//! The benchmark core only needs two operations from a store: point reads and
//! point writes. Isolation, conflict detection and ordering between concurrent
//! callers are entirely the store's business.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Error reported by a backing store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("backend: {0}")]
    Backend(String),

    #[error("store lock poisoned")]
    Poisoned,
}

/// A key-value store addressed by string keys.
///
/// Implementations must be safe to share between threads: the driver invokes
/// many workloads concurrently against one store.
pub trait KvStore: Send + Sync {
    /// Read the value at `key`. `Ok(None)` is a miss.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Insert or overwrite the value at `key`.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).put(key, value)
    }
}

impl<T: KvStore + ?Sized> KvStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).put(key, value)
    }
}

/// In-process store backed by a `HashMap` behind an `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = match self.entries.read() {
            Ok(entries) => entries.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        keys.sort();
        keys
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get() {
        let store = MemoryStore::new();
        assert_eq!(store.get("A0").unwrap(), None);

        store.put("A0", b"iii").unwrap();
        assert_eq!(store.get("A0").unwrap(), Some(b"iii".to_vec()));

        store.put("A0", b"w").unwrap();
        assert_eq!(store.get("A0").unwrap(), Some(b"w".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn shared_through_arc_and_ref() {
        let store = Arc::new(MemoryStore::new());
        let by_ref: &MemoryStore = &store;

        by_ref.put("k", b"v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.keys(), vec!["k".to_string()]);
    }
}
