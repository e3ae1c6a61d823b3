//! Pet listings.

use crate::errors::AppError;
use crate::models::{
    calculate_pet_stats, AgeGroup, EnergyLevel, Pet, PetSize, PetStats, PetStatus, PetType,
};
use crate::repository::ids::counter_id;
use crate::repository::{JsonPatch, JsonRepository, Record};
use crate::store::Storage;

use super::require;

/// Pet listings.
#[derive(Clone)]
pub struct PetService {
    pets: JsonRepository<Pet>,
}

impl PetService {
    pub fn new(storage: Storage) -> Self {
        Self::with_seed(storage, default_pets())
    }

    pub fn with_seed(storage: Storage, seed: Vec<Record<Pet>>) -> Self {
        Self {
            pets: JsonRepository::with_seed(storage, seed),
        }
    }

    /// The underlying repository, shared with services that update pets.
    pub fn repository(&self) -> &JsonRepository<Pet> {
        &self.pets
    }

    pub async fn list_pets(&self) -> Result<Vec<Record<Pet>>, AppError> {
        self.pets.list().await
    }

    pub async fn get_pet(&self, id: &str) -> Result<Option<Record<Pet>>, AppError> {
        self.pets.get(id).await
    }

    pub async fn add_pet(&self, pet: Pet) -> Result<String, AppError> {
        require(&pet.name, "Pet name")?;
        require(&pet.shelter_id, "Shelter id")?;
        self.pets.add(pet).await
    }

    pub async fn update_pet(
        &self,
        id: &str,
        patch: &JsonPatch,
    ) -> Result<Option<Record<Pet>>, AppError> {
        self.pets.update(id, patch).await
    }

    pub async fn set_status(
        &self,
        id: &str,
        status: PetStatus,
    ) -> Result<Option<Record<Pet>>, AppError> {
        self.pets
            .update_with(id, |pet| {
                pet.status = status;
                Ok(())
            })
            .await
    }

    pub async fn delete_pet(&self, id: &str) -> Result<bool, AppError> {
        self.pets.delete(id).await
    }

    pub async fn available_pets(&self) -> Result<Vec<Record<Pet>>, AppError> {
        self.pets
            .filter(|p| p.status == PetStatus::Available)
            .await
    }

    pub async fn pets_by_type(&self, pet_type: PetType) -> Result<Vec<Record<Pet>>, AppError> {
        self.pets.filter(|p| p.pet_type == pet_type).await
    }

    pub async fn stats(&self) -> Result<PetStats, AppError> {
        Ok(calculate_pet_stats(&self.pets.list().await?))
    }
}

fn seed_pet(
    n: usize,
    name: &str,
    pet_type: PetType,
    breed: &str,
    size: PetSize,
    age: AgeGroup,
    energy_level: EnergyLevel,
    status: PetStatus,
    distance_km: f64,
) -> Record<Pet> {
    Record::new(
        counter_id("pet", n),
        Pet {
            name: name.to_string(),
            pet_type,
            breed: breed.to_string(),
            size,
            age,
            energy_level,
            location: "Portland".to_string(),
            distance_km: Some(distance_km),
            status,
            good_with_kids: true,
            good_with_pets: pet_type != PetType::Bird,
            description: format!("{} is a friendly {} looking for a home.", name, breed),
            shelter_id: "shelter-1".to_string(),
            created_at: "2024-01-15T09:00:00Z".to_string(),
            updated_at: "2024-01-15T09:00:00Z".to_string(),
        },
    )
}

pub fn default_pets() -> Vec<Record<Pet>> {
    use AgeGroup::*;
    vec![
        seed_pet(
            1,
            "Buddy",
            PetType::Dog,
            "Golden Retriever",
            PetSize::Large,
            Young,
            EnergyLevel::High,
            PetStatus::Available,
            4.0,
        ),
        seed_pet(
            2,
            "Luna",
            PetType::Cat,
            "Siamese",
            PetSize::Small,
            Adult,
            EnergyLevel::Low,
            PetStatus::Available,
            7.5,
        ),
        seed_pet(
            3,
            "Max",
            PetType::Dog,
            "Beagle",
            PetSize::Medium,
            Young,
            EnergyLevel::Medium,
            PetStatus::Available,
            12.0,
        ),
        seed_pet(
            4,
            "Coco",
            PetType::Rabbit,
            "Holland Lop",
            PetSize::Small,
            Baby,
            EnergyLevel::Medium,
            PetStatus::Pending,
            3.2,
        ),
        seed_pet(
            5,
            "Rocky",
            PetType::Dog,
            "Boxer",
            PetSize::Large,
            Senior,
            EnergyLevel::Low,
            PetStatus::Adopted,
            20.0,
        ),
        seed_pet(
            6,
            "Kiwi",
            PetType::Bird,
            "Parakeet",
            PetSize::Small,
            Adult,
            EnergyLevel::High,
            PetStatus::Fostered,
            9.0,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_seed_and_filters() {
        let service = PetService::new(Storage::in_memory());
        assert_eq!(service.list_pets().await.unwrap().len(), 6);
        assert_eq!(service.available_pets().await.unwrap().len(), 3);
        assert_eq!(service.pets_by_type(PetType::Dog).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_add_pet_requires_name() {
        let service = PetService::with_seed(Storage::in_memory(), Vec::new());
        let mut pet = default_pets().remove(0).fields;
        pet.name = "  ".to_string();
        assert!(matches!(service.add_pet(pet).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_set_status_updates_stats() {
        let service = PetService::new(Storage::in_memory());
        service.set_status("pet-1", PetStatus::Adopted).await.unwrap().unwrap();
        let stats = service.stats().await.unwrap();
        assert_eq!(stats.adopted, 2);
        assert_eq!(stats.available, 2);
        assert_eq!(stats.available_rate, 33.33);
    }
}
