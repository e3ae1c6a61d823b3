//! Foster network and placements.

use chrono::Utc;

use crate::errors::AppError;
use crate::models::{
    calculate_foster_stats, FosterParent, FosterPlacement, FosterStats, Pet, PetStatus, PetType,
    PlacementStatus,
};
use crate::repository::ids::counter_id;
use crate::repository::{JsonPatch, JsonRepository, Record};
use crate::store::Storage;

use super::require;

/// Foster network and placements.
///
/// Starting a placement writes pets, foster parents and placements in that
/// order; ending one writes them in reverse.
#[derive(Clone)]
pub struct FosterService {
    parents: JsonRepository<FosterParent>,
    placements: JsonRepository<FosterPlacement>,
    pets: JsonRepository<Pet>,
}

impl FosterService {
    pub fn new(storage: Storage, pets: JsonRepository<Pet>) -> Self {
        Self::with_seed(storage, pets, default_foster_parents(), default_placements())
    }

    pub fn with_seed(
        storage: Storage,
        pets: JsonRepository<Pet>,
        parents: Vec<Record<FosterParent>>,
        placements: Vec<Record<FosterPlacement>>,
    ) -> Self {
        Self {
            parents: JsonRepository::with_seed(storage.clone(), parents),
            placements: JsonRepository::with_seed(storage, placements),
            pets,
        }
    }

    pub async fn list_foster_parents(&self) -> Result<Vec<Record<FosterParent>>, AppError> {
        self.parents.list().await
    }

    pub async fn get_foster_parent(
        &self,
        id: &str,
    ) -> Result<Option<Record<FosterParent>>, AppError> {
        self.parents.get(id).await
    }

    pub async fn add_foster_parent(&self, parent: FosterParent) -> Result<String, AppError> {
        require(&parent.name, "Foster parent name")?;
        require(&parent.email, "Foster parent email")?;
        self.parents.add(parent).await
    }

    pub async fn update_foster_parent(
        &self,
        id: &str,
        patch: &JsonPatch,
    ) -> Result<Option<Record<FosterParent>>, AppError> {
        self.parents.update(id, patch).await
    }

    pub async fn delete_foster_parent(&self, id: &str) -> Result<bool, AppError> {
        self.parents.delete(id).await
    }

    /// Active parents with room for a pet of `pet_type`.
    pub async fn available_foster_parents(
        &self,
        pet_type: PetType,
    ) -> Result<Vec<Record<FosterParent>>, AppError> {
        self.parents
            .filter(|p| p.has_room() && p.accepts_type(pet_type))
            .await
    }

    pub async fn list_placements(&self) -> Result<Vec<Record<FosterPlacement>>, AppError> {
        self.placements.list().await
    }

    pub async fn active_placements(&self) -> Result<Vec<Record<FosterPlacement>>, AppError> {
        self.placements
            .filter(|p| p.status == PlacementStatus::Active)
            .await
    }

    /// Place a pet with a foster parent.
    ///
    /// The pet is claimed first, under its collection lock, so two placements
    /// of one pet cannot both succeed. A parent that turns out to be full
    /// hands the pet back to its previous status.
    pub async fn start_placement(
        &self,
        pet_id: &str,
        foster_id: &str,
        notes: Option<String>,
    ) -> Result<String, AppError> {
        let pet = self
            .pets
            .get(pet_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pet {} not found", pet_id)))?;
        let parent = self
            .parents
            .get(foster_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Foster parent {} not found", foster_id)))?;
        if !parent.accepts_type(pet.pet_type) {
            return Err(AppError::Validation(format!(
                "{} does not foster {} pets",
                parent.name,
                pet.pet_type.as_str()
            )));
        }

        let mut previous = None;
        let claimed = self
            .pets
            .update_with(pet_id, |pet| {
                if matches!(pet.status, PetStatus::Adopted | PetStatus::Fostered) {
                    return Err(AppError::Validation(format!(
                        "{} is already {}",
                        pet.name,
                        pet.status.as_str()
                    )));
                }
                previous = Some(pet.status);
                pet.status = PetStatus::Fostered;
                Ok(())
            })
            .await?;
        let (Some(_), Some(previous)) = (claimed, previous) else {
            return Err(AppError::NotFound(format!("Pet {} not found", pet_id)));
        };

        let slot = self
            .parents
            .update_with(foster_id, |parent| parent.take_pet())
            .await;
        let slot_error = match slot {
            Ok(Some(_)) => None,
            Ok(None) => Some(AppError::NotFound(format!(
                "Foster parent {} not found",
                foster_id
            ))),
            Err(e) => Some(e),
        };
        if let Some(error) = slot_error {
            self.pets
                .update_with(pet_id, |pet| {
                    if pet.status == PetStatus::Fostered {
                        pet.status = previous;
                    }
                    Ok(())
                })
                .await?;
            return Err(error);
        }

        let id = self
            .placements
            .add(FosterPlacement {
                pet_id: pet_id.to_string(),
                foster_id: foster_id.to_string(),
                start_date: String::new(),
                end_date: None,
                status: PlacementStatus::Active,
                notes: notes.unwrap_or_default(),
            })
            .await?;

        tracing::info!("Placed {} with foster {} ({})", pet_id, foster_id, id);
        Ok(id)
    }

    /// End an active placement and return the pet to the adoptable list.
    pub async fn end_placement(
        &self,
        placement_id: &str,
    ) -> Result<Option<Record<FosterPlacement>>, AppError> {
        let now = Utc::now().to_rfc3339();
        let ended = self
            .placements
            .update_with(placement_id, |placement| {
                if placement.status != PlacementStatus::Active {
                    return Err(AppError::Validation(format!(
                        "Placement {} is not active",
                        placement_id
                    )));
                }
                placement.status = PlacementStatus::Completed;
                placement.end_date = Some(now);
                Ok(())
            })
            .await?;

        let Some(ended) = ended else {
            return Ok(None);
        };

        self.parents
            .update_with(&ended.foster_id, |parent| {
                parent.release_pet();
                Ok(())
            })
            .await?;
        self.pets
            .update_with(&ended.pet_id, |pet| {
                if pet.status == PetStatus::Fostered {
                    pet.status = PetStatus::Available;
                }
                Ok(())
            })
            .await?;

        tracing::info!("Ended placement {}", placement_id);
        Ok(Some(ended))
    }

    pub async fn stats(&self) -> Result<FosterStats, AppError> {
        let parents = self.parents.list().await?;
        let placements = self.placements.list().await?;
        Ok(calculate_foster_stats(&parents, &placements))
    }
}

pub fn default_foster_parents() -> Vec<Record<FosterParent>> {
    vec![
        Record::new(
            counter_id("foster", 1),
            FosterParent {
                name: "Jordan Rivera".to_string(),
                email: "jordan.rivera@example.com".to_string(),
                phone: "555-0142".to_string(),
                capacity: 2,
                current_pets: 1,
                accepts: vec![PetType::Bird, PetType::Rabbit],
                experience_years: 3,
                active: true,
                joined_at: "2022-08-14T00:00:00Z".to_string(),
            },
        ),
        Record::new(
            counter_id("foster", 2),
            FosterParent {
                name: "Hannah Okafor".to_string(),
                email: "hannah.okafor@example.com".to_string(),
                phone: "555-0178".to_string(),
                capacity: 3,
                current_pets: 0,
                accepts: vec![PetType::Dog, PetType::Cat],
                experience_years: 6,
                active: true,
                joined_at: "2021-03-02T00:00:00Z".to_string(),
            },
        ),
        Record::new(
            counter_id("foster", 3),
            FosterParent {
                name: "Wes Liang".to_string(),
                email: "wes.liang@example.com".to_string(),
                phone: String::new(),
                capacity: 1,
                current_pets: 0,
                accepts: Vec::new(),
                experience_years: 1,
                active: false,
                joined_at: "2023-10-20T00:00:00Z".to_string(),
            },
        ),
    ]
}

pub fn default_placements() -> Vec<Record<FosterPlacement>> {
    vec![Record::new(
        counter_id("place", 1),
        FosterPlacement {
            pet_id: "pet-6".to_string(),
            foster_id: "foster-1".to_string(),
            start_date: "2024-04-02T00:00:00Z".to_string(),
            end_date: None,
            status: PlacementStatus::Active,
            notes: "Needs a quiet room while feathers regrow".to_string(),
        },
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::PetService;

    fn services() -> (FosterService, PetService) {
        let storage = Storage::in_memory();
        let pets = PetService::new(storage.clone());
        (FosterService::new(storage, pets.repository().clone()), pets)
    }

    #[tokio::test]
    async fn test_start_and_end_placement() {
        let (foster, pets) = services();
        let id = foster.start_placement("pet-3", "foster-2", None).await.unwrap();

        assert_eq!(pets.get_pet("pet-3").await.unwrap().unwrap().status, PetStatus::Fostered);
        assert_eq!(foster.get_foster_parent("foster-2").await.unwrap().unwrap().current_pets, 1);
        assert_eq!(foster.active_placements().await.unwrap().len(), 2);

        let ended = foster.end_placement(&id).await.unwrap().unwrap();
        assert_eq!(ended.status, PlacementStatus::Completed);
        assert!(ended.end_date.is_some());
        assert_eq!(pets.get_pet("pet-3").await.unwrap().unwrap().status, PetStatus::Available);
        assert_eq!(foster.get_foster_parent("foster-2").await.unwrap().unwrap().current_pets, 0);

        assert!(foster.end_placement(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_start_placement_checks_species_and_pet() {
        let (foster, _) = services();
        // foster-1 takes birds and rabbits only
        assert!(matches!(
            foster.start_placement("pet-3", "foster-1", None).await,
            Err(AppError::Validation(_))
        ));
        // pet-5 is adopted
        assert!(foster.start_placement("pet-5", "foster-2", None).await.is_err());
        // inactive parent has no room
        assert!(foster.start_placement("pet-3", "foster-3", None).await.is_err());
        assert_eq!(foster.active_placements().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_full_parent_hands_pet_back() {
        let (foster, pets) = services();
        assert!(matches!(
            foster.start_placement("pet-3", "foster-3", None).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(pets.get_pet("pet-3").await.unwrap().unwrap().status, PetStatus::Available);
        assert_eq!(foster.get_foster_parent("foster-3").await.unwrap().unwrap().current_pets, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_one_pet_cannot_be_placed_twice() {
        for _ in 0..20 {
            let (foster, pets) = services();
            let second_parent = foster
                .add_foster_parent(FosterParent {
                    name: "Dana Cole".to_string(),
                    email: "dana.cole@example.com".to_string(),
                    phone: String::new(),
                    capacity: 2,
                    current_pets: 0,
                    accepts: vec![PetType::Dog],
                    experience_years: 2,
                    active: true,
                    joined_at: String::new(),
                })
                .await
                .unwrap();

            let mut handles = Vec::new();
            for parent_id in ["foster-2".to_string(), second_parent] {
                let foster = foster.clone();
                handles.push(tokio::spawn(async move {
                    foster.start_placement("pet-3", &parent_id, None).await
                }));
            }

            let mut placed = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(_) => placed += 1,
                    Err(e) => assert!(matches!(e, AppError::Validation(_)), "{:?}", e),
                }
            }
            assert_eq!(placed, 1);

            let active: Vec<_> = foster
                .active_placements()
                .await
                .unwrap()
                .into_iter()
                .filter(|p| p.pet_id == "pet-3")
                .collect();
            assert_eq!(active.len(), 1);
            let claimed: u32 = foster
                .list_foster_parents()
                .await
                .unwrap()
                .iter()
                .map(|p| p.current_pets)
                .sum();
            assert_eq!(claimed, 2);
            assert_eq!(pets.get_pet("pet-3").await.unwrap().unwrap().status, PetStatus::Fostered);
        }
    }

    #[tokio::test]
    async fn test_available_parents_and_stats() {
        let (foster, _) = services();
        let for_dogs = foster.available_foster_parents(PetType::Dog).await.unwrap();
        assert_eq!(for_dogs.len(), 1);
        assert_eq!(for_dogs[0].id, "foster-2");

        let stats = foster.stats().await.unwrap();
        assert_eq!(stats.total_capacity, 5);
        assert_eq!(stats.current_pets, 1);
        assert_eq!(stats.utilization_rate, 20.0);
        assert_eq!(stats.active_placements, 1);
    }
}
