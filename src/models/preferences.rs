//! Adopter preferences consumed by pet matching.

use serde::{Deserialize, Serialize};

use super::{AgeGroup, EnergyLevel, PetSize, PetType};
use crate::repository::{Entity, Record};

/// One record per user; the record id is the user id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub pet_types: Vec<PetType>,
    #[serde(default)]
    pub sizes: Vec<PetSize>,
    #[serde(default)]
    pub ages: Vec<AgeGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_level: Option<EnergyLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_distance_km: Option<f64>,
    #[serde(default)]
    pub updated_at: String,
}

impl UserPreferences {
    pub fn for_user(user_id: impl Into<String>, prefs: UserPreferences) -> Record<UserPreferences> {
        Record::new(user_id, prefs)
    }
}

impl Entity for UserPreferences {
    const ID_PREFIX: &'static str = "prefs";
    const STORAGE_KEY: &'static str = "user_preferences";

    fn touch(&mut self, now: &str) {
        self.updated_at = now.to_string();
    }
}
