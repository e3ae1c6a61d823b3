//! SQLite-backed store using the `kv_entries` table.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use super::{conflict, KeyValueStore, StoredValue};
use crate::db::init_database;
use crate::errors::AppError;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `db_path`.
    pub async fn open(db_path: &Path) -> Result<Self, AppError> {
        let pool = init_database(db_path).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn current_version(&self, key: &str) -> Result<Option<i64>, AppError> {
        let row = sqlx::query("SELECT version FROM kv_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("version")))
    }

    async fn increment_revision(&self) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get_item(&self, key: &str) -> Result<Option<StoredValue>, AppError> {
        let row = sqlx::query("SELECT value, version, updated_at FROM kv_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| StoredValue {
            value: r.get("value"),
            version: r.get("version"),
            updated_at: r.get("updated_at"),
        }))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<i64, AppError> {
        let now = Utc::now().to_rfc3339();
        let row = sqlx::query(
            r#"INSERT INTO kv_entries (key, value, version, updated_at) VALUES (?, ?, 1, ?)
               ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   version = kv_entries.version + 1,
                   updated_at = excluded.updated_at
               RETURNING version"#,
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        self.increment_revision().await?;
        Ok(row.get("version"))
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected_version: Option<i64>,
        value: &str,
    ) -> Result<i64, AppError> {
        let now = Utc::now().to_rfc3339();

        let result = match expected_version {
            None => {
                sqlx::query(
                    "INSERT INTO kv_entries (key, value, version, updated_at) VALUES (?, ?, 1, ?) ON CONFLICT(key) DO NOTHING",
                )
                .bind(key)
                .bind(value)
                .bind(&now)
                .execute(&self.pool)
                .await?
            }
            Some(expected) => {
                sqlx::query(
                    "UPDATE kv_entries SET value = ?, version = version + 1, updated_at = ? WHERE key = ? AND version = ?",
                )
                .bind(value)
                .bind(&now)
                .bind(key)
                .bind(expected)
                .execute(&self.pool)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            let current = self.current_version(key).await?;
            tracing::warn!("Concurrent modification detected on key {}", key);
            return Err(conflict(key, expected_version, current));
        }

        self.increment_revision().await?;
        Ok(expected_version.map_or(1, |v| v + 1))
    }

    async fn remove_item(&self, key: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM kv_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        self.increment_revision().await?;
        Ok(true)
    }

    async fn keys(&self) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query("SELECT key FROM kv_entries ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|r| r.get("key")).collect())
    }

    async fn revision(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_store() -> (SqliteStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&temp_dir.path().join("kv.sqlite"))
            .await
            .unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_upsert_bumps_version_and_revision() {
        let (store, _dir) = open_store().await;

        assert_eq!(store.set_item("pets", "[]").await.unwrap(), 1);
        assert_eq!(store.set_item("pets", "[{}]").await.unwrap(), 2);

        let stored = store.get_item("pets").await.unwrap().unwrap();
        assert_eq!(stored.value, "[{}]");
        assert_eq!(stored.version, 2);
        assert_eq!(store.revision().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_compare_and_set_conflicts() {
        let (store, _dir) = open_store().await;

        assert_eq!(store.compare_and_set("k", None, "a").await.unwrap(), 1);
        let err = store.compare_and_set("k", None, "b").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { current_version: 1, .. }));

        let err = store.compare_and_set("k", Some(7), "b").await.unwrap_err();
        assert!(err.is_conflict());

        assert_eq!(store.compare_and_set("k", Some(1), "c").await.unwrap(), 2);
        assert_eq!(store.get_item("k").await.unwrap().unwrap().value, "c");
    }

    #[tokio::test]
    async fn test_remove_item() {
        let (store, _dir) = open_store().await;
        store.set_item("a", "1").await.unwrap();
        store.set_item("b", "2").await.unwrap();

        assert!(store.remove_item("a").await.unwrap());
        assert!(!store.remove_item("a").await.unwrap());
        assert_eq!(store.keys().await.unwrap(), vec!["b".to_string()]);
    }
}
