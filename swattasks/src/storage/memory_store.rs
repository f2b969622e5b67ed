//! In-memory store
//!
//! Implements both storage ports without touching disk. Used by tests and
//! anywhere a throwaway store is enough. Reads and writes can be made to
//! fail on demand to exercise the repository's error paths.

use super::{Collection, KeyValueStore, StoragePort};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory record and key/value store
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Collection, BTreeMap<String, Value>>>,
    items: Mutex<BTreeMap<String, String>>,
    fail_open: AtomicBool,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    // Successful writes left before writes start failing
    writes_left: Mutex<Option<usize>>,
    opens: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `initialize` fail with `StorageUnavailable`
    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Make every read fail with `StorageRead`
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write fail with `StorageWrite`. Clearing it also cancels
    /// [`fail_writes_after`](Self::fail_writes_after).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
        if !fail {
            *self.writes_left.lock() = None;
        }
    }

    /// Let the next `n` writes succeed, then fail every write after them
    pub fn fail_writes_after(&self, n: usize) {
        *self.writes_left.lock() = Some(n);
    }

    /// Number of successful `initialize` calls
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of records currently held in a collection
    pub fn len(&self, collection: Collection) -> usize {
        self.collections
            .lock()
            .get(&collection)
            .map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::StorageRead("simulated read failure".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::StorageWrite(
                "simulated write failure".to_string(),
            ));
        }

        let mut writes_left = self.writes_left.lock();
        match writes_left.as_mut() {
            Some(0) => Err(AppError::StorageWrite(
                "simulated write failure".to_string(),
            )),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StoragePort for MemoryStore {
    async fn initialize(&self) -> Result<()> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(AppError::StorageUnavailable(
                "simulated open failure".to_string(),
            ));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<Value>> {
        self.check_read()?;
        Ok(self
            .collections
            .lock()
            .get(&collection)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>> {
        self.check_read()?;
        Ok(self
            .collections
            .lock()
            .get(&collection)
            .and_then(|records| records.get(key).cloned()))
    }

    async fn put(&self, collection: Collection, record: &Value) -> Result<()> {
        let key = collection.key_of(record)?.to_string();
        self.check_write()?;
        self.collections
            .lock()
            .entry(collection)
            .or_default()
            .insert(key, record.clone());
        Ok(())
    }

    async fn delete(&self, collection: Collection, key: &str) -> Result<()> {
        self.check_write()?;
        if let Some(records) = self.collections.lock().get_mut(&collection) {
            records.remove(key);
        }
        Ok(())
    }

    async fn clear(&self, collection: Collection) -> Result<()> {
        self.check_write()?;
        self.collections.lock().remove(&collection);
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.check_read()?;
        Ok(self.items.lock().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.check_write()?;
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.check_write()?;
        self.items.lock().remove(key);
        Ok(())
    }

    async fn clear_items(&self) -> Result<()> {
        self.check_write()?;
        self.items.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fail_writes_after() {
        let store = MemoryStore::new();
        store.fail_writes_after(1);

        store
            .put(Collection::Todos, &json!({ "id": "a", "title": "ok" }))
            .await
            .unwrap();
        let second = store
            .put(Collection::Todos, &json!({ "id": "b", "title": "no" }))
            .await;

        assert!(matches!(second, Err(AppError::StorageWrite(_))));
        assert_eq!(store.len(Collection::Todos), 1);

        store.set_fail_writes(false);
        store
            .put(Collection::Todos, &json!({ "id": "b", "title": "yes" }))
            .await
            .unwrap();
        assert_eq!(store.len(Collection::Todos), 2);
    }
}
