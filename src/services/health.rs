//! Veterinary health records.

use crate::errors::AppError;
use crate::models::{
    calculate_health_stats, pet_history, HealthRecord, HealthRecordKind, HealthStats,
};
use crate::repository::ids::counter_id;
use crate::repository::{JsonPatch, JsonRepository, Record};
use crate::store::Storage;

use super::{days_from_today, require, today};

/// Health history of shelter animals.
#[derive(Clone)]
pub struct HealthService {
    records: JsonRepository<HealthRecord>,
}

impl HealthService {
    pub fn new(storage: Storage) -> Self {
        Self::with_seed(storage, default_health_records())
    }

    pub fn with_seed(storage: Storage, seed: Vec<Record<HealthRecord>>) -> Self {
        Self {
            records: JsonRepository::with_seed(storage, seed),
        }
    }

    pub async fn list_health_records(&self) -> Result<Vec<Record<HealthRecord>>, AppError> {
        self.records.list().await
    }

    pub async fn get_health_record(
        &self,
        id: &str,
    ) -> Result<Option<Record<HealthRecord>>, AppError> {
        self.records.get(id).await
    }

    pub async fn add_health_record(&self, record: HealthRecord) -> Result<String, AppError> {
        require(&record.pet_id, "Pet id")?;
        require(&record.veterinarian, "Veterinarian")?;
        if record.cost < 0.0 {
            return Err(AppError::Validation("Cost cannot be negative".to_string()));
        }
        self.records.add(record).await
    }

    pub async fn update_health_record(
        &self,
        id: &str,
        patch: &JsonPatch,
    ) -> Result<Option<Record<HealthRecord>>, AppError> {
        self.records.update(id, patch).await
    }

    pub async fn delete_health_record(&self, id: &str) -> Result<bool, AppError> {
        self.records.delete(id).await
    }

    /// One pet's records, newest first.
    pub async fn pet_history(&self, pet_id: &str) -> Result<Vec<Record<HealthRecord>>, AppError> {
        Ok(pet_history(&self.records.list().await?, pet_id))
    }

    pub async fn stats(&self) -> Result<HealthStats, AppError> {
        Ok(calculate_health_stats(&self.records.list().await?, today()))
    }
}

pub fn default_health_records() -> Vec<Record<HealthRecord>> {
    let recheck = days_from_today(45);
    let rows = [
        (
            "pet-1",
            "Buddy",
            HealthRecordKind::Checkup,
            "2024-01-16",
            "Intake exam, healthy",
            "",
            65.0,
            None,
        ),
        (
            "pet-2",
            "Luna",
            HealthRecordKind::Dental,
            "2024-02-08",
            "Tartar build-up",
            "Scaling and polish",
            180.0,
            Some("2024-08-08"),
        ),
        (
            "pet-1",
            "Buddy",
            HealthRecordKind::Treatment,
            "2024-03-21",
            "Ear infection",
            "Antibiotic drops, 10 days",
            42.5,
            Some("2024-04-04"),
        ),
        (
            "pet-5",
            "Rocky",
            HealthRecordKind::Surgery,
            "2024-02-27",
            "Torn cruciate ligament",
            "TPLO surgery",
            1450.0,
            Some(recheck.as_str()),
        ),
    ];
    rows.into_iter()
        .enumerate()
        .map(|(i, (pet_id, pet_name, kind, date, diagnosis, treatment, cost, follow_up))| {
            Record::new(
                counter_id("health", i + 1),
                HealthRecord {
                    pet_id: pet_id.to_string(),
                    pet_name: pet_name.to_string(),
                    kind,
                    date: date.to_string(),
                    veterinarian: "Dr. Amara Patel".to_string(),
                    diagnosis: diagnosis.to_string(),
                    treatment: treatment.to_string(),
                    cost,
                    follow_up_date: follow_up.map(str::to_string),
                },
            )
        })
        .collect()
}
