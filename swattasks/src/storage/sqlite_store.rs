//! SQLite-backed record store
//!
//! Each collection is a table of `(key, record)` rows where `record` is the
//! JSON document. The pool is opened on first use and kept for the lifetime
//! of the store.
//!
//! Every operation runs in an explicit transaction and reports success only
//! once `commit()` has returned, so a failed commit surfaces as an error even
//! when the individual statement succeeded.

use super::{Collection, StoragePort};
use crate::database::{create_pool, database_path};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

/// Record store over a lazily opened SQLite pool
pub struct SqliteStore {
    db_path: PathBuf,
    pool: OnceCell<SqlitePool>,
}

impl SqliteStore {
    /// Store backed by the given database file
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            db_path,
            pool: OnceCell::new(),
        }
    }

    /// Store using the default database file inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(database_path(data_dir))
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    async fn pool(&self) -> Result<&SqlitePool> {
        self.pool
            .get_or_try_init(|| async {
                create_pool(&self.db_path).await.map_err(|e| {
                    tracing::error!("Failed to open database {:?}: {}", self.db_path, e);
                    AppError::StorageUnavailable(e.to_string())
                })
            })
            .await
    }
}

fn read_error(e: sqlx::Error) -> AppError {
    AppError::StorageRead(e.to_string())
}

fn write_error(e: sqlx::Error) -> AppError {
    AppError::StorageWrite(e.to_string())
}

fn parse_record(collection: Collection, raw: &str) -> Result<Value> {
    serde_json::from_str(raw).map_err(|e| {
        AppError::StorageRead(format!("corrupt record in {}: {}", collection, e))
    })
}

#[async_trait]
impl StoragePort for SqliteStore {
    async fn initialize(&self) -> Result<()> {
        self.pool().await?;
        Ok(())
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<Value>> {
        let pool = self.pool().await?;
        let sql = format!("SELECT record FROM {}", collection.name());

        let mut tx = pool.begin().await.map_err(read_error)?;
        let rows: Vec<String> = sqlx::query_scalar(&sql)
            .fetch_all(&mut *tx)
            .await
            .map_err(read_error)?;
        tx.commit().await.map_err(read_error)?;

        rows.iter()
            .map(|raw| parse_record(collection, raw))
            .collect()
    }

    async fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>> {
        let pool = self.pool().await?;
        let sql = format!(
            "SELECT record FROM {} WHERE {} = ?",
            collection.name(),
            collection.key_field()
        );

        let mut tx = pool.begin().await.map_err(read_error)?;
        let row: Option<String> = sqlx::query_scalar(&sql)
            .bind(key)
            .fetch_optional(&mut *tx)
            .await
            .map_err(read_error)?;
        tx.commit().await.map_err(read_error)?;

        row.map(|raw| parse_record(collection, &raw)).transpose()
    }

    async fn put(&self, collection: Collection, record: &Value) -> Result<()> {
        let key = collection.key_of(record)?;
        let body = serde_json::to_string(record)?;
        let pool = self.pool().await?;
        let sql = format!(
            r#"
            INSERT INTO {table} ({key}, record) VALUES (?, ?)
            ON CONFLICT({key}) DO UPDATE SET record = excluded.record
            "#,
            table = collection.name(),
            key = collection.key_field()
        );

        let mut tx = pool.begin().await.map_err(write_error)?;
        sqlx::query(&sql)
            .bind(key)
            .bind(&body)
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;
        tx.commit().await.map_err(write_error)?;

        tracing::debug!("Put {} record: {}", collection, key);
        Ok(())
    }

    async fn delete(&self, collection: Collection, key: &str) -> Result<()> {
        let pool = self.pool().await?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            collection.name(),
            collection.key_field()
        );

        let mut tx = pool.begin().await.map_err(write_error)?;
        let result = sqlx::query(&sql)
            .bind(key)
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;
        tx.commit().await.map_err(write_error)?;

        tracing::debug!(
            "Deleted {} record: {} ({} rows)",
            collection,
            key,
            result.rows_affected()
        );
        Ok(())
    }

    async fn clear(&self, collection: Collection) -> Result<()> {
        let pool = self.pool().await?;
        let sql = format!("DELETE FROM {}", collection.name());

        let mut tx = pool.begin().await.map_err(write_error)?;
        sqlx::query(&sql)
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;
        tx.commit().await.map_err(write_error)?;

        tracing::info!("Cleared collection: {}", collection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_store() -> (SqliteStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::in_dir(temp_dir.path());
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let (store, _temp) = create_test_store();

        store.initialize().await.unwrap();
        let first = store.pool().await.unwrap() as *const SqlitePool;
        store.initialize().await.unwrap();
        let second = store.pool().await.unwrap() as *const SqlitePool;

        assert_eq!(first, second);
        assert!(store.db_path().exists());
    }

    #[tokio::test]
    async fn test_put_get_and_upsert() {
        let (store, _temp) = create_test_store();

        store
            .put(Collection::Todos, &json!({ "id": "t1", "title": "First" }))
            .await
            .unwrap();
        store
            .put(Collection::Todos, &json!({ "id": "t1", "title": "Replaced" }))
            .await
            .unwrap();

        let all = store.get_all(Collection::Todos).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0]["title"], "Replaced");

        let one = store.get(Collection::Todos, "t1").await.unwrap().unwrap();
        assert_eq!(one["title"], "Replaced");
        assert!(store.get(Collection::Todos, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_absent_key_is_ok() {
        let (store, _temp) = create_test_store();

        store.delete(Collection::Todos, "missing").await.unwrap();
    }

    #[tokio::test]
    async fn test_collections_are_independent() {
        let (store, _temp) = create_test_store();

        store
            .put(Collection::Todos, &json!({ "id": "t1", "title": "Task" }))
            .await
            .unwrap();
        store
            .put(Collection::Settings, &json!({ "key": "theme", "value": "dark" }))
            .await
            .unwrap();

        store.clear(Collection::Todos).await.unwrap();

        assert!(store.get_all(Collection::Todos).await.unwrap().is_empty());
        assert_eq!(store.get_all(Collection::Settings).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_put_rejects_record_without_key() {
        let (store, _temp) = create_test_store();

        let result = store
            .put(Collection::Settings, &json!({ "value": "dark" }))
            .await;

        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_unopenable_database_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the database file should be
        let blocked = temp_dir.path().join("blocked");
        std::fs::create_dir_all(&blocked).unwrap();
        let store = SqliteStore::new(blocked);

        let result = store.initialize().await;

        assert!(matches!(result, Err(AppError::StorageUnavailable(_))));
    }
}
