//! Vaccination records and due dates.

use crate::errors::AppError;
use crate::models::{calculate_vaccination_stats, due_vaccinations, Vaccination, VaccinationStats};
use crate::repository::ids::counter_id;
use crate::repository::{JsonPatch, JsonRepository, Record};
use crate::stats::parse_date;
use crate::store::Storage;

use super::{require, today};

/// Vaccination records.
#[derive(Clone)]
pub struct VaccinationService {
    vaccinations: JsonRepository<Vaccination>,
}

impl VaccinationService {
    pub fn new(storage: Storage) -> Self {
        Self::with_seed(storage, default_vaccinations())
    }

    pub fn with_seed(storage: Storage, seed: Vec<Record<Vaccination>>) -> Self {
        Self {
            vaccinations: JsonRepository::with_seed(storage, seed),
        }
    }

    pub async fn list_vaccinations(&self) -> Result<Vec<Record<Vaccination>>, AppError> {
        self.vaccinations.list().await
    }

    pub async fn get_vaccination(&self, id: &str) -> Result<Option<Record<Vaccination>>, AppError> {
        self.vaccinations.get(id).await
    }

    pub async fn add_vaccination(&self, vaccination: Vaccination) -> Result<String, AppError> {
        require(&vaccination.pet_id, "Pet id")?;
        require(&vaccination.vaccine, "Vaccine")?;
        if parse_date(&vaccination.next_due).is_none() {
            return Err(AppError::Validation(format!(
                "Next due date '{}' is not a valid date",
                vaccination.next_due
            )));
        }
        self.vaccinations.add(vaccination).await
    }

    pub async fn update_vaccination(
        &self,
        id: &str,
        patch: &JsonPatch,
    ) -> Result<Option<Record<Vaccination>>, AppError> {
        self.vaccinations.update(id, patch).await
    }

    pub async fn delete_vaccination(&self, id: &str) -> Result<bool, AppError> {
        self.vaccinations.delete(id).await
    }

    /// Overdue or due within the due-soon window.
    pub async fn due_vaccinations(&self) -> Result<Vec<Record<Vaccination>>, AppError> {
        Ok(due_vaccinations(&self.vaccinations.list().await?, today()))
    }

    pub async fn stats(&self) -> Result<VaccinationStats, AppError> {
        Ok(calculate_vaccination_stats(&self.vaccinations.list().await?, today()))
    }
}

pub fn default_vaccinations() -> Vec<Record<Vaccination>> {
    let rows = [
        ("pet-1", "Buddy", "Rabies", "2024-01-16", "2027-01-16"),
        ("pet-1", "Buddy", "DHPP", "2024-01-16", "2025-01-16"),
        ("pet-2", "Luna", "FVRCP", "2023-11-02", "2024-11-02"),
        ("pet-3", "Max", "Bordetella", "2023-05-10", "2024-05-10"),
    ];
    rows.into_iter()
        .enumerate()
        .map(|(i, (pet_id, pet_name, vaccine, administered_on, next_due))| {
            Record::new(
                counter_id("vax", i + 1),
                Vaccination {
                    pet_id: pet_id.to_string(),
                    pet_name: pet_name.to_string(),
                    vaccine: vaccine.to_string(),
                    administered_on: administered_on.to_string(),
                    next_due: next_due.to_string(),
                    administered_by: "Dr. Amara Patel".to_string(),
                    batch_number: None,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stats_partition_all_records() {
        let service = VaccinationService::new(Storage::in_memory());
        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.current + stats.due_soon + stats.overdue, stats.total);
        assert_eq!(
            service.due_vaccinations().await.unwrap().len(),
            stats.due_soon + stats.overdue
        );
    }

    #[tokio::test]
    async fn test_add_requires_due_date() {
        let service = VaccinationService::new(Storage::in_memory());
        let mut vaccination = default_vaccinations().remove(0).fields;
        vaccination.next_due = "someday".to_string();
        assert!(service.add_vaccination(vaccination).await.is_err());
    }
}
