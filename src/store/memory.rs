//! Volatile store kept in a `HashMap`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{conflict, KeyValueStore, StoredValue};
use crate::errors::AppError;

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredValue>>,
    revision: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&self) {
        self.revision.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<StoredValue>, AppError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<i64, AppError> {
        let mut entries = self.entries.write().await;
        let version = entries.get(key).map_or(1, |e| e.version + 1);
        entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                version,
                updated_at: Utc::now().to_rfc3339(),
            },
        );
        self.bump();
        Ok(version)
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected_version: Option<i64>,
        value: &str,
    ) -> Result<i64, AppError> {
        let mut entries = self.entries.write().await;
        let current = entries.get(key).map(|e| e.version);
        if current != expected_version {
            return Err(conflict(key, expected_version, current));
        }

        let version = current.map_or(1, |v| v + 1);
        entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                version,
                updated_at: Utc::now().to_rfc3339(),
            },
        );
        self.bump();
        Ok(version)
    }

    async fn remove_item(&self, key: &str) -> Result<bool, AppError> {
        let removed = self.entries.write().await.remove(key).is_some();
        if removed {
            self.bump();
        }
        Ok(removed)
    }

    async fn keys(&self) -> Result<Vec<String>, AppError> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn revision(&self) -> Result<i64, AppError> {
        Ok(self.revision.load(Ordering::SeqCst))
    }
}
