//! Foster parents and the placements linking them to pets.

use serde::{Deserialize, Serialize};

use super::PetType;
use crate::errors::AppError;
use crate::repository::{Entity, Record};
use crate::stats::percentage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FosterParent {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub capacity: u32,
    #[serde(default)]
    pub current_pets: u32,
    #[serde(default)]
    pub accepts: Vec<PetType>,
    #[serde(default)]
    pub experience_years: u32,
    pub active: bool,
    #[serde(default)]
    pub joined_at: String,
}

impl FosterParent {
    pub fn has_room(&self) -> bool {
        self.active && self.current_pets < self.capacity
    }

    /// Whether this parent takes the given species. An empty list takes any.
    pub fn accepts_type(&self, pet_type: PetType) -> bool {
        self.accepts.is_empty() || self.accepts.contains(&pet_type)
    }

    pub fn take_pet(&mut self) -> Result<(), AppError> {
        if !self.has_room() {
            return Err(AppError::Validation(format!(
                "{} has no foster space available",
                self.name
            )));
        }
        self.current_pets += 1;
        Ok(())
    }

    pub fn release_pet(&mut self) {
        self.current_pets = self.current_pets.saturating_sub(1);
    }
}

impl Entity for FosterParent {
    const ID_PREFIX: &'static str = "foster";
    const STORAGE_KEY: &'static str = "foster_parents";

    fn on_create(&mut self, now: &str) {
        if self.joined_at.is_empty() {
            self.joined_at = now.to_string();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementStatus {
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FosterPlacement {
    pub pet_id: String,
    pub foster_id: String,
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub status: PlacementStatus,
    #[serde(default)]
    pub notes: String,
}

impl Entity for FosterPlacement {
    const ID_PREFIX: &'static str = "place";
    const STORAGE_KEY: &'static str = "foster_placements";

    fn on_create(&mut self, now: &str) {
        if self.start_date.is_empty() {
            self.start_date = now.to_string();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FosterStats {
    pub total_parents: usize,
    pub active_parents: usize,
    pub total_capacity: u32,
    pub current_pets: u32,
    pub available_slots: u32,
    pub utilization_rate: f64,
    pub active_placements: usize,
    pub completed_placements: usize,
}

pub fn calculate_foster_stats(
    parents: &[Record<FosterParent>],
    placements: &[Record<FosterPlacement>],
) -> FosterStats {
    let active: Vec<&Record<FosterParent>> = parents.iter().filter(|p| p.active).collect();
    let total_capacity: u32 = active.iter().map(|p| p.capacity).sum();
    let current_pets: u32 = active.iter().map(|p| p.current_pets).sum();
    let count = |status: PlacementStatus| placements.iter().filter(|p| p.status == status).count();

    FosterStats {
        total_parents: parents.len(),
        active_parents: active.len(),
        total_capacity,
        current_pets,
        available_slots: total_capacity.saturating_sub(current_pets),
        utilization_rate: percentage(current_pets as usize, total_capacity as usize),
        active_placements: count(PlacementStatus::Active),
        completed_placements: count(PlacementStatus::Completed),
    }
}
