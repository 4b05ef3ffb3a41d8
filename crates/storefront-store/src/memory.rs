//! In-memory key-value store for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::{KeyValueStore, StoreError, StoreResult};

/// In-process key-value store.
///
/// Shares nothing with other instances; wrap it in an `Arc` and hand clones
/// of the `Arc` to successive stores to simulate a process restart.
/// Each operation kind can be switched to fail on demand.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_removes: AtomicBool,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Configure `get` to fail
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Configure `set` to fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Configure `remove` to fail
    pub fn set_fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, Ordering::SeqCst);
    }

    /// Raw stored value, bypassing failure injection
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    /// Seed a raw value, bypassing failure injection
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries().insert(key.into(), value.into());
    }

    /// Number of successful `set` calls
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("Mock read failure".into()));
        }
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("Mock write failure".into()));
        }
        self.insert_raw(key, value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("Mock remove failure".into()));
        }
        self.entries().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_roundtrip() {
        let store = MemoryStore::new();
        store.set("a", "1").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(store.write_count(), 1);

        store.remove("a").await.unwrap();
        store.remove("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_failure_injection() {
        let store = MemoryStore::new();
        store.insert_raw("a", "1");

        store.set_fail_reads(true);
        assert!(store.get("a").await.is_err());

        store.set_fail_writes(true);
        assert!(store.set("a", "2").await.is_err());
        assert_eq!(store.raw("a").as_deref(), Some("1"));
        assert_eq!(store.write_count(), 0);

        store.set_fail_removes(true);
        assert!(store.remove("a").await.is_err());
        assert!(store.contains_key("a"));

        store.set_fail_reads(false);
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
    }
}
