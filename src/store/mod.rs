//! Persistent key-value store for JSON collections.
//!
//! Every collection lives under one string key. Values carry a version so
//! writers can commit with compare-and-set instead of blind overwrites.

mod locks;
mod memory;
mod sqlite;

pub use locks::KeyLocks;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::AppError;

/// A stored value together with its version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredValue {
    pub value: String,
    pub version: i64,
    pub updated_at: String,
}

/// Async string-keyed blob store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get_item(&self, key: &str) -> Result<Option<StoredValue>, AppError>;

    /// Write `value` unconditionally and return the new version.
    async fn set_item(&self, key: &str, value: &str) -> Result<i64, AppError>;

    /// Write `value` only if the stored version equals `expected_version`.
    ///
    /// `None` requires the key to be absent. A mismatch is reported as
    /// [`AppError::Conflict`] with the version currently stored (0 if absent).
    async fn compare_and_set(
        &self,
        key: &str,
        expected_version: Option<i64>,
        value: &str,
    ) -> Result<i64, AppError>;

    /// Remove `key`. Returns whether it existed.
    async fn remove_item(&self, key: &str) -> Result<bool, AppError>;

    /// All keys, sorted.
    async fn keys(&self) -> Result<Vec<String>, AppError>;

    /// Global counter bumped by every successful write or removal.
    async fn revision(&self) -> Result<i64, AppError>;
}

/// Shared handle to a store plus the per-key write locks.
///
/// Repositories built from clones of the same `Storage` serialize their
/// read-modify-write cycles on each key.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KeyValueStore>,
    locks: KeyLocks,
}

impl Storage {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            locks: KeyLocks::default(),
        }
    }

    /// Storage over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn backend(&self) -> &dyn KeyValueStore {
        self.backend.as_ref()
    }

    pub fn locks(&self) -> &KeyLocks {
        &self.locks
    }
}

pub(crate) fn conflict(key: &str, expected: Option<i64>, current: Option<i64>) -> AppError {
    AppError::Conflict {
        message: format!(
            "Version mismatch on '{}': expected {}, current {}",
            key,
            expected.map_or_else(|| "absent".to_string(), |v| v.to_string()),
            current.map_or_else(|| "absent".to_string(), |v| v.to_string()),
        ),
        current_version: current.unwrap_or(0),
    }
}
