//! Completed adoptions, returns and adoption analytics.

use crate::errors::AppError;
use crate::models::{calculate_adoption_analytics, AdoptionAnalytics, AdoptionRecord, PetType};
use crate::repository::ids::counter_id;
use crate::repository::{JsonPatch, JsonRepository, Record};
use crate::stats::sort_by_date_desc;
use crate::store::Storage;

use super::require;

/// Completed adoptions and their analytics.
#[derive(Clone)]
pub struct AdoptionService {
    records: JsonRepository<AdoptionRecord>,
}

impl AdoptionService {
    pub fn new(storage: Storage) -> Self {
        Self::with_seed(storage, default_adoption_records())
    }

    pub fn with_seed(storage: Storage, seed: Vec<Record<AdoptionRecord>>) -> Self {
        Self {
            records: JsonRepository::with_seed(storage, seed),
        }
    }

    /// Newest adoption first.
    pub async fn list_adoptions(&self) -> Result<Vec<Record<AdoptionRecord>>, AppError> {
        let mut records = self.records.list().await?;
        sort_by_date_desc(&mut records, |r| r.adopted_at.as_str());
        Ok(records)
    }

    pub async fn get_adoption(&self, id: &str) -> Result<Option<Record<AdoptionRecord>>, AppError> {
        self.records.get(id).await
    }

    pub async fn add_adoption(&self, record: AdoptionRecord) -> Result<String, AppError> {
        require(&record.pet_id, "Pet id")?;
        require(&record.adopter_id, "Adopter id")?;
        if record.adoption_fee < 0.0 {
            return Err(AppError::Validation(
                "Adoption fee cannot be negative".to_string(),
            ));
        }
        self.records.add(record).await
    }

    pub async fn update_adoption(
        &self,
        id: &str,
        patch: &JsonPatch,
    ) -> Result<Option<Record<AdoptionRecord>>, AppError> {
        self.records.update(id, patch).await
    }

    /// Flag an adoption as returned to the shelter.
    pub async fn mark_returned(
        &self,
        id: &str,
    ) -> Result<Option<Record<AdoptionRecord>>, AppError> {
        self.records
            .update_with(id, |record| {
                record.returned = true;
                Ok(())
            })
            .await
    }

    pub async fn delete_adoption(&self, id: &str) -> Result<bool, AppError> {
        self.records.delete(id).await
    }

    pub async fn analytics(&self) -> Result<AdoptionAnalytics, AppError> {
        Ok(calculate_adoption_analytics(&self.records.list().await?))
    }
}

pub fn default_adoption_records() -> Vec<Record<AdoptionRecord>> {
    let rows = [
        ("pet-5", "Rocky", PetType::Dog, "user-priya", "2024-03-20", 45, 150.0),
        ("pet-11", "Mittens", PetType::Cat, "user-jo", "2024-02-14", 21, 85.0),
        ("pet-12", "Bandit", PetType::Dog, "user-lee", "2024-01-09", 60, 150.0),
        ("pet-13", "Pip", PetType::Bird, "user-sam", "2024-04-03", 12, 40.0),
        ("pet-14", "Shadow", PetType::Cat, "user-kai", "2024-04-22", 33, 85.0),
    ];
    rows.into_iter()
        .enumerate()
        .map(|(i, (pet_id, pet_name, pet_type, adopter_id, adopted_at, days, fee))| {
            Record::new(
                counter_id("adopt", i + 1),
                AdoptionRecord {
                    pet_id: pet_id.to_string(),
                    pet_name: pet_name.to_string(),
                    pet_type,
                    adopter_id: adopter_id.to_string(),
                    adopted_at: adopted_at.to_string(),
                    days_in_shelter: days,
                    adoption_fee: fee,
                    returned: false,
                },
            )
        })
        .collect()
}
