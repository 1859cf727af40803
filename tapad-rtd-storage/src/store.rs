//! Key-value store contract and the in-memory implementation.
//!
//! The host owns persistence (browser local storage, a file, a shared
//! cache). This crate only consumes it through [`KeyValueStore`].

use std::collections::HashMap;
use std::sync::RwLock;

use tapad_rtd_core::{RtdResult, StorageError};

/// String key-value store provided by the host.
///
/// Implementations must be thread-safe: a background refresh writes while
/// bidding cycles read. Writes are last-writer-wins; no transactions are
/// expected.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key is not set.
    fn get(&self, key: &str) -> RtdResult<Option<String>>;

    /// Set a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> RtdResult<()>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> RtdResult<()>;
}

/// Statistics about store usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Reads that found a value.
    pub hits: u64,
    /// Reads that found nothing.
    pub misses: u64,
    /// Number of `set` calls.
    pub writes: u64,
    /// Number of `remove` calls.
    pub removals: u64,
}

impl StoreStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// In-memory store for tests, tools and hosts without persistence.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, String>>,
    stats: RwLock<StoreStats>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently set.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Check if no keys are set.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every key.
    pub fn clear(&self) -> RtdResult<()> {
        self.entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .clear();
        Ok(())
    }

    /// Snapshot of the usage counters.
    pub fn stats(&self) -> StoreStats {
        self.stats.read().map(|s| *s).unwrap_or_default()
    }

    fn record(&self, update: impl FnOnce(&mut StoreStats)) {
        if let Ok(mut stats) = self.stats.write() {
            update(&mut stats);
        }
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> RtdResult<Option<String>> {
        let value = self
            .entries
            .read()
            .map_err(|_| StorageError::LockPoisoned)?
            .get(key)
            .cloned();
        if value.is_some() {
            self.record(|s| s.hits += 1);
        } else {
            self.record(|s| s.misses += 1);
        }
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> RtdResult<()> {
        self.entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .insert(key.to_string(), value.to_string());
        self.record(|s| s.writes += 1);
        Ok(())
    }

    fn remove(&self, key: &str) -> RtdResult<()> {
        self.entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .remove(key);
        self.record(|s| s.removals += 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_store_roundtrip() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);

        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_in_memory_store_clear() {
        let store = InMemoryStore::new();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_stats() {
        let store = InMemoryStore::new();
        store.set("a", "1").unwrap();
        store.get("a").unwrap();
        store.get("a").unwrap();
        store.get("missing").unwrap();
        store.remove("a").unwrap();

        let stats = store.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.removals, 1);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 0.001);

        assert!((StoreStats::default().hit_rate() - 0.0).abs() < 0.001);
    }
}
