//! Storage module
//!
//! Defines the storage ports the task repository writes through:
//! - [`StoragePort`]: keyed record collections in a transactional database
//! - [`KeyValueStore`]: a simple string key/value store used as a fallback tier

pub mod json_file_store;
pub mod memory_store;
pub mod sqlite_store;

pub use json_file_store::JsonFileStore;
pub use memory_store::MemoryStore;
pub use sqlite_store::SqliteStore;

use crate::config::{SETTINGS_COLLECTION, TODOS_COLLECTION};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// A named record collection with a single key field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Todos,
    Settings,
}

impl Collection {
    /// Table name backing the collection
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Todos => TODOS_COLLECTION,
            Collection::Settings => SETTINGS_COLLECTION,
        }
    }

    /// Record field holding the primary key
    pub fn key_field(&self) -> &'static str {
        match self {
            Collection::Todos => "id",
            Collection::Settings => "key",
        }
    }

    /// Extract the key from a record of this collection.
    pub fn key_of<'a>(&self, record: &'a Value) -> Result<&'a str> {
        record
            .get(self.key_field())
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                AppError::InvalidArgument(format!(
                    "{} record is missing a non-empty `{}`",
                    self.name(),
                    self.key_field()
                ))
            })
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Durable keyed storage across the task and settings collections.
///
/// Every method resolves only after its transaction has committed.
#[async_trait]
pub trait StoragePort: Send + Sync {
    /// Open (creating or upgrading if needed) the underlying database.
    /// Repeat calls reuse the same handle.
    async fn initialize(&self) -> Result<()>;

    /// All records of a collection, in no particular order
    async fn get_all(&self, collection: Collection) -> Result<Vec<Value>>;

    /// Single record by key
    async fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>>;

    /// Insert or replace a record by its key
    async fn put(&self, collection: Collection, record: &Value) -> Result<()>;

    /// Remove a record. Absent keys are not an error.
    async fn delete(&self, collection: Collection, key: &str) -> Result<()>;

    /// Remove every record of a collection
    async fn clear(&self, collection: Collection) -> Result<()>;
}

/// Simple string key/value store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    async fn remove_item(&self, key: &str) -> Result<()>;

    async fn clear_items(&self) -> Result<()>;
}
