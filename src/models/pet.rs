//! Pet listing model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::repository::{Entity, Record};
use crate::stats::{breakdown, percentage};

/// Species of a listed pet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PetType {
    Dog,
    Cat,
    Rabbit,
    Bird,
    Other,
}

impl PetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PetType::Dog => "Dog",
            PetType::Cat => "Cat",
            PetType::Rabbit => "Rabbit",
            PetType::Bird => "Bird",
            PetType::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PetSize {
    Small,
    Medium,
    Large,
}

impl PetSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            PetSize::Small => "Small",
            PetSize::Medium => "Medium",
            PetSize::Large => "Large",
        }
    }
}

/// Age bucket shown on listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    Baby,
    Young,
    Adult,
    Senior,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Baby => "Baby",
            AgeGroup::Young => "Young",
            AgeGroup::Adult => "Adult",
            AgeGroup::Senior => "Senior",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    Low,
    Medium,
    High,
}

impl EnergyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyLevel::Low => "low",
            EnergyLevel::Medium => "medium",
            EnergyLevel::High => "high",
        }
    }

    /// Levels one step apart (low/medium, medium/high).
    pub fn is_adjacent(&self, other: &EnergyLevel) -> bool {
        (*self as i8 - *other as i8).abs() == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    Available,
    Pending,
    Adopted,
    Fostered,
    Medical,
}

impl PetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PetStatus::Available => "available",
            PetStatus::Pending => "pending",
            PetStatus::Adopted => "adopted",
            PetStatus::Fostered => "fostered",
            PetStatus::Medical => "medical",
        }
    }
}

/// A pet listed by a shelter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub name: String,
    #[serde(rename = "type")]
    pub pet_type: PetType,
    pub breed: String,
    pub size: PetSize,
    pub age: AgeGroup,
    pub energy_level: EnergyLevel,
    pub location: String,
    /// Distance from the viewing adopter, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    pub status: PetStatus,
    #[serde(default)]
    pub good_with_kids: bool,
    #[serde(default)]
    pub good_with_pets: bool,
    #[serde(default)]
    pub description: String,
    pub shelter_id: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Entity for Pet {
    const ID_PREFIX: &'static str = "pet";
    const STORAGE_KEY: &'static str = "pets";

    fn on_create(&mut self, now: &str) {
        if self.created_at.is_empty() {
            self.created_at = now.to_string();
        }
        self.updated_at = self.created_at.clone();
    }

    fn touch(&mut self, now: &str) {
        self.updated_at = now.to_string();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PetStats {
    pub total: usize,
    pub available: usize,
    pub adopted: usize,
    pub available_rate: f64,
    pub by_type: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
}

pub fn calculate_pet_stats(pets: &[Record<Pet>]) -> PetStats {
    let available = pets
        .iter()
        .filter(|p| p.status == PetStatus::Available)
        .count();
    let adopted = pets
        .iter()
        .filter(|p| p.status == PetStatus::Adopted)
        .count();

    PetStats {
        total: pets.len(),
        available,
        adopted,
        available_rate: percentage(available, pets.len()),
        by_type: breakdown(pets.iter().map(|p| p.pet_type.as_str())),
        by_status: breakdown(pets.iter().map(|p| p.status.as_str())),
    }
}
