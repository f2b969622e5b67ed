//! JSON file key/value store
//!
//! Secondary storage tier: a flat string map persisted as a pretty-printed
//! JSON object. A missing file reads as an empty map.

use super::KeyValueStore;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

/// Key/value store persisted to a single JSON file
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse {:?}: {}", self.path, e)))
    }

    async fn save(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, content).await?;
        tracing::debug!("Fallback store saved to {:?}", self.path);

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        map.insert(key.to_string(), value.to_string());
        self.save(&map).await
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        if map.remove(key).is_some() {
            self.save(&map).await?;
        }
        Ok(())
    }

    async fn clear_items(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        if self.path.exists() {
            fs::remove_file(&self.path).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (JsonFileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("fallback.json"));
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let (store, _temp) = create_test_store();

        assert_eq!(store.get_item("theme").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_get_remove() {
        let (store, _temp) = create_test_store();

        store.set_item("theme", "dark").await.unwrap();
        store.set_item("other", "x").await.unwrap();
        assert_eq!(store.get_item("theme").await.unwrap(), Some("dark".to_string()));

        store.remove_item("theme").await.unwrap();
        assert_eq!(store.get_item("theme").await.unwrap(), None);
        assert_eq!(store.get_item("other").await.unwrap(), Some("x".to_string()));
    }

    #[tokio::test]
    async fn test_values_survive_new_instance() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fallback.json");

        JsonFileStore::new(path.clone())
            .set_item("theme", "sepia")
            .await
            .unwrap();

        let reopened = JsonFileStore::new(path);
        assert_eq!(reopened.get_item("theme").await.unwrap(), Some("sepia".to_string()));
    }

    #[tokio::test]
    async fn test_clear_items_removes_file() {
        let (store, temp) = create_test_store();

        store.set_item("theme", "dark").await.unwrap();
        store.clear_items().await.unwrap();

        assert!(!temp.path().join("fallback.json").exists());
        assert_eq!(store.get_item("theme").await.unwrap(), None);

        // Clearing twice is fine
        store.clear_items().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let (store, temp) = create_test_store();
        std::fs::write(temp.path().join("fallback.json"), "not json").unwrap();

        assert!(store.get_item("theme").await.is_err());
    }
}
