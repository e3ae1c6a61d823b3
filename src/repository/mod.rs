//! Generic repository over one JSON collection per storage key.
//!
//! Each write reads the whole collection, changes it in memory and writes the
//! whole collection back. The cycle runs under the key's lock and commits with
//! compare-and-set against the version it read, so overlapping writers never
//! drop each other's changes.

pub mod ids;

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::store::Storage;

/// Domain fields of a stored record.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Prefix of generated ids, e.g. `"pet"`.
    const ID_PREFIX: &'static str;
    /// Default storage key of the collection.
    const STORAGE_KEY: &'static str;

    /// Called by `add` before the record is stored.
    fn on_create(&mut self, _now: &str) {}

    /// Called after every update with the current RFC 3339 timestamp.
    fn touch(&mut self, _now: &str) {}
}

/// A record as stored: its id plus the entity fields, flattened in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: String,
    #[serde(flatten)]
    pub fields: T,
}

impl<T> Record<T> {
    pub fn new(id: impl Into<String>, fields: T) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

impl<T> Deref for Record<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.fields
    }
}

impl<T> DerefMut for Record<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.fields
    }
}

/// Shallow merge patch: top-level keys replace the record's fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonPatch(Map<String, Value>);

impl JsonPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a patch from a JSON object.
    pub fn from_value(value: Value) -> Result<Self, AppError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(AppError::Validation(format!(
                "Patch must be a JSON object, got {}",
                other
            ))),
        }
    }

    /// Set one field.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Merge into `target`. An `id` key is ignored.
    pub fn apply<T: Entity>(&self, target: &mut T) -> Result<(), AppError> {
        let mut value = serde_json::to_value(&*target)?;
        let object = value
            .as_object_mut()
            .ok_or_else(|| AppError::Internal("Entity must serialize to an object".to_string()))?;

        for (field, patch_value) in &self.0 {
            if field == "id" {
                continue;
            }
            object.insert(field.clone(), patch_value.clone());
        }

        *target = serde_json::from_value(value)?;
        Ok(())
    }
}

/// CRUD over the collection stored under one key.
pub struct JsonRepository<T: Entity> {
    storage: Storage,
    key: String,
    seed: Arc<Vec<Record<T>>>,
}

impl<T: Entity> Clone for JsonRepository<T> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            key: self.key.clone(),
            seed: Arc::clone(&self.seed),
        }
    }
}

impl<T: Entity> JsonRepository<T> {
    /// Repository with an empty seed.
    pub fn new(storage: Storage) -> Self {
        Self::with_seed(storage, Vec::new())
    }

    /// Repository that writes `seed` the first time the collection is read.
    pub fn with_seed(storage: Storage, seed: Vec<Record<T>>) -> Self {
        Self {
            storage,
            key: T::STORAGE_KEY.to_string(),
            seed: Arc::new(seed),
        }
    }

    /// Store the collection under `key` instead of the entity default.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn seed(&self) -> &[Record<T>] {
        &self.seed
    }

    /// The whole collection, seeding it on first access.
    ///
    /// A stored blob that fails to parse is reported and the seed returned in
    /// its place; the stored blob is left as it is.
    pub async fn list(&self) -> Result<Vec<Record<T>>, AppError> {
        let (records, version) = self.load().await?;
        if version.is_some() {
            return Ok(records);
        }

        let _guard = self.storage.locks().lock(&self.key).await;
        let (records, _) = self.load_or_seed().await?;
        Ok(records)
    }

    /// Find one record by id.
    pub async fn get(&self, id: &str) -> Result<Option<Record<T>>, AppError> {
        Ok(self.list().await?.into_iter().find(|r| r.id == id))
    }

    /// Records matching `predicate`, in storage order.
    pub async fn filter<F>(&self, predicate: F) -> Result<Vec<Record<T>>, AppError>
    where
        F: Fn(&Record<T>) -> bool,
    {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|r| predicate(r))
            .collect())
    }

    /// Append a record with a generated id and return the id.
    pub async fn add(&self, mut fields: T) -> Result<String, AppError> {
        fields.on_create(&Utc::now().to_rfc3339());
        let id = self
            .mutate(move |records| {
                let id = loop {
                    let candidate = ids::generate_id(T::ID_PREFIX);
                    if !records.iter().any(|r| r.id == candidate) {
                        break candidate;
                    }
                };
                records.push(Record::new(id.clone(), fields));
                Ok((id, true))
            })
            .await?;

        tracing::info!("Added {} to {}", id, self.key);
        Ok(id)
    }

    /// Insert `record`, replacing any record with the same id.
    pub async fn upsert(&self, record: Record<T>) -> Result<Record<T>, AppError> {
        self.mutate(move |records| {
            match records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => records.push(record.clone()),
            }
            Ok((record, true))
        })
        .await
    }

    /// Shallow-merge `patch` into the record. `None` if the id is unknown.
    pub async fn update(&self, id: &str, patch: &JsonPatch) -> Result<Option<Record<T>>, AppError> {
        self.update_with(id, |fields| patch.apply(fields)).await
    }

    /// Change the record in place. An error from `change` aborts without writing.
    pub async fn update_with<F>(&self, id: &str, change: F) -> Result<Option<Record<T>>, AppError>
    where
        F: FnOnce(&mut T) -> Result<(), AppError>,
    {
        let now = Utc::now().to_rfc3339();
        let updated = self
            .mutate(|records| match records.iter_mut().find(|r| r.id == id) {
                None => Ok((None, false)),
                Some(record) => {
                    change(&mut record.fields)?;
                    record.fields.touch(&now);
                    Ok((Some(record.clone()), true))
                }
            })
            .await?;

        match &updated {
            Some(_) => tracing::info!("Updated {} in {}", id, self.key),
            None => tracing::debug!("No record {} in {}", id, self.key),
        }
        Ok(updated)
    }

    /// Remove the record. Returns whether it existed.
    pub async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let removed = self
            .mutate(|records| {
                let before = records.len();
                records.retain(|r| r.id != id);
                let removed = records.len() != before;
                Ok((removed, removed))
            })
            .await?;

        if removed {
            tracing::info!("Deleted {} from {}", id, self.key);
        }
        Ok(removed)
    }

    /// Overwrite the whole collection.
    pub async fn replace_all(&self, records: Vec<Record<T>>) -> Result<(), AppError> {
        self.mutate(move |current| {
            *current = records;
            Ok(((), true))
        })
        .await
    }

    /// Remove the stored collection; the next read seeds it again.
    pub async fn reset(&self) -> Result<bool, AppError> {
        let _guard = self.storage.locks().lock(&self.key).await;
        self.storage.backend().remove_item(&self.key).await
    }

    /// Read-modify-write under the key lock. `change` returns its result and
    /// whether the collection needs writing back.
    async fn mutate<R, F>(&self, change: F) -> Result<R, AppError>
    where
        F: FnOnce(&mut Vec<Record<T>>) -> Result<(R, bool), AppError>,
    {
        let _guard = self.storage.locks().lock(&self.key).await;
        let (mut records, version) = self.load_or_seed().await?;

        let (result, changed) = change(&mut records)?;
        if changed {
            let json = serde_json::to_string(&records)?;
            self.storage
                .backend()
                .compare_and_set(&self.key, Some(version), &json)
                .await?;
        }
        Ok(result)
    }

    /// Current collection and its stored version, `None` when nothing is stored.
    async fn load(&self) -> Result<(Vec<Record<T>>, Option<i64>), AppError> {
        let Some(stored) = self.storage.backend().get_item(&self.key).await? else {
            return Ok((self.seed.to_vec(), None));
        };

        match serde_json::from_str::<Vec<Record<T>>>(&stored.value) {
            Ok(records) => {
                tracing::debug!("Loaded {} records from {}", records.len(), self.key);
                Ok((records, Some(stored.version)))
            }
            Err(e) => {
                tracing::warn!(
                    "Stored collection {} is unreadable, using defaults: {}",
                    self.key,
                    e
                );
                Ok((self.seed.to_vec(), Some(stored.version)))
            }
        }
    }

    /// Like `load`, but writes the seed when nothing is stored. Caller holds the lock.
    async fn load_or_seed(&self) -> Result<(Vec<Record<T>>, i64), AppError> {
        let (records, version) = self.load().await?;
        if let Some(version) = version {
            return Ok((records, version));
        }

        let json = serde_json::to_string(&records)?;
        match self
            .storage
            .backend()
            .compare_and_set(&self.key, None, &json)
            .await
        {
            Ok(version) => {
                tracing::info!("Seeded {} with {} records", self.key, records.len());
                Ok((records, version))
            }
            Err(AppError::Conflict { .. }) => {
                // Another handle seeded it first
                tracing::debug!("{} was seeded concurrently, reloading", self.key);
                match self.load().await? {
                    (stored, Some(version)) => Ok((stored, version)),
                    (_, None) => Err(AppError::Storage(format!(
                        "Collection {} vanished while seeding",
                        self.key
                    ))),
                }
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Note {
        title: String,
        pinned: bool,
        #[serde(default)]
        updated_at: Option<String>,
    }

    impl Entity for Note {
        const ID_PREFIX: &'static str = "note";
        const STORAGE_KEY: &'static str = "notes";

        fn touch(&mut self, now: &str) {
            self.updated_at = Some(now.to_string());
        }
    }

    fn note(title: &str) -> Note {
        Note {
            title: title.to_string(),
            pinned: false,
            updated_at: None,
        }
    }

    fn seeded(storage: Storage) -> JsonRepository<Note> {
        JsonRepository::with_seed(
            storage,
            vec![
                Record::new(ids::counter_id("note", 1), note("first")),
                Record::new(ids::counter_id("note", 2), note("second")),
            ],
        )
    }

    #[test]
    fn test_record_json_is_flat() {
        let record = Record::new("note-1", note("hello"));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], "note-1");
        assert_eq!(value["title"], "hello");
        assert!(value.get("fields").is_none());
    }

    #[test]
    fn test_patch_ignores_id_and_keeps_other_fields() {
        let mut target = note("old");
        let patch = JsonPatch::new().with("id", "hijack").with("pinned", true);
        patch.apply(&mut target).unwrap();
        assert_eq!(target.title, "old");
        assert!(target.pinned);
    }

    #[test]
    fn test_patch_rejects_wrong_type() {
        let mut target = note("old");
        let patch = JsonPatch::new().with("pinned", "yes");
        assert!(patch.apply(&mut target).is_err());
        assert_eq!(target, note("old"));
        assert!(JsonPatch::from_value(json!([1, 2])).is_err());
    }

    #[tokio::test]
    async fn test_list_seeds_once() {
        let storage = Storage::in_memory();
        let repo = seeded(storage.clone());

        let first = repo.list().await.unwrap();
        let revision = storage.backend().revision().await.unwrap();
        let second = repo.list().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(revision, 1);
        assert_eq!(storage.backend().revision().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_blob_falls_back_to_seed() {
        let storage = Storage::in_memory();
        storage.backend().set_item("notes", "{not json").await.unwrap();
        let repo = seeded(storage.clone());

        let records = repo.list().await.unwrap();
        assert_eq!(records, repo.seed().to_vec());
        // The corrupted value is not overwritten by a read
        let stored = storage.backend().get_item("notes").await.unwrap().unwrap();
        assert_eq!(stored.value, "{not json");
    }

    #[tokio::test]
    async fn test_add_then_get() {
        let repo = seeded(Storage::in_memory());
        let id = repo.add(note("third")).await.unwrap();

        assert!(id.starts_with("note-"));
        let found = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(found.fields, note("third"));
        assert_eq!(repo.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_missing_id_leaves_collection() {
        let repo = seeded(Storage::in_memory());
        let before = repo.list().await.unwrap();

        let patch = JsonPatch::new().with("pinned", true);
        assert!(repo.update("note-99", &patch).await.unwrap().is_none());
        assert_eq!(repo.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_update_touches_only_target() {
        let repo = seeded(Storage::in_memory());
        let before = repo.list().await.unwrap();

        let patch = JsonPatch::new().with("pinned", true);
        let updated = repo.update("note-2", &patch).await.unwrap().unwrap();
        assert!(updated.pinned);
        assert_eq!(updated.title, "second");
        assert!(updated.updated_at.is_some());

        let after = repo.list().await.unwrap();
        assert_eq!(after[0], before[0]);
        assert_eq!(after[1], updated);
    }

    #[tokio::test]
    async fn test_failed_change_does_not_write() {
        let storage = Storage::in_memory();
        let repo = seeded(storage.clone());
        repo.list().await.unwrap();
        let revision = storage.backend().revision().await.unwrap();

        let result = repo
            .update_with("note-1", |_| Err(AppError::Validation("nope".to_string())))
            .await;
        assert!(result.is_err());
        assert_eq!(storage.backend().revision().await.unwrap(), revision);
    }

    #[tokio::test]
    async fn test_delete_and_reset() {
        let repo = seeded(Storage::in_memory());
        assert!(repo.delete("note-1").await.unwrap());
        assert!(!repo.delete("note-1").await.unwrap());
        assert_eq!(repo.list().await.unwrap().len(), 1);

        assert!(repo.reset().await.unwrap());
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let repo = seeded(Storage::in_memory());
        repo.upsert(Record::new("note-1", note("renamed"))).await.unwrap();
        repo.upsert(Record::new("note-7", note("new"))).await.unwrap();

        let records = repo.list().await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].title, "renamed");
        assert_eq!(records[2].id, "note-7");
    }

    #[tokio::test]
    async fn test_with_key_isolates_collections() {
        let storage = Storage::in_memory();
        let a = JsonRepository::<Note>::new(storage.clone()).with_key("notes_a");
        let b = JsonRepository::<Note>::new(storage.clone()).with_key("notes_b");

        a.add(note("only in a")).await.unwrap();
        assert_eq!(a.list().await.unwrap().len(), 1);
        assert!(b.list().await.unwrap().is_empty());
    }
}
