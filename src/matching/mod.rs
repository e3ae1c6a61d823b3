//! Pet matching: a fixed weighted score between a pet and an adopter's
//! preferences.
//!
//! Each dimension the adopter specified contributes its weight when it
//! matches. The final score is the earned share of the specified weight,
//! scaled to 0..=100. Unspecified dimensions neither help nor hurt.

use serde::Serialize;

use crate::errors::AppError;
use crate::models::{Pet, PetStatus, UserPreferences};
use crate::repository::{JsonRepository, Record};
use crate::store::Storage;

pub const TYPE_WEIGHT: u32 = 30;
pub const SIZE_WEIGHT: u32 = 20;
pub const AGE_WEIGHT: u32 = 20;
pub const ENERGY_WEIGHT: u32 = 15;
pub const LOCATION_WEIGHT: u32 = 15;

/// Partial credit for an energy level one step away.
const ADJACENT_ENERGY_CREDIT: u32 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub pet_id: String,
    pub pet_name: String,
    pub match_score: u32,
    pub reasons: Vec<String>,
}

struct Tally {
    earned: u32,
    possible: u32,
    reasons: Vec<String>,
}

impl Tally {
    fn new() -> Self {
        Self {
            earned: 0,
            possible: 0,
            reasons: Vec::new(),
        }
    }

    fn score(&mut self, weight: u32, credit: u32, reason: Option<String>) {
        self.possible += weight;
        self.earned += credit.min(weight);
        if credit > 0 {
            self.reasons.extend(reason);
        }
    }

    fn percent(&self) -> u32 {
        if self.possible == 0 {
            return 0;
        }
        (f64::from(self.earned) / f64::from(self.possible) * 100.0).round() as u32
    }
}

pub fn calculate_pet_match(pet: &Record<Pet>, prefs: &UserPreferences) -> MatchResult {
    let mut tally = Tally::new();

    if !prefs.pet_types.is_empty() {
        let hit = prefs.pet_types.contains(&pet.pet_type);
        tally.score(
            TYPE_WEIGHT,
            if hit { TYPE_WEIGHT } else { 0 },
            Some(format!("{} is the type of pet you're looking for", pet.name)),
        );
    }

    if !prefs.sizes.is_empty() {
        let hit = prefs.sizes.contains(&pet.size);
        tally.score(
            SIZE_WEIGHT,
            if hit { SIZE_WEIGHT } else { 0 },
            Some(format!("{} size fits your home", pet.size.as_str())),
        );
    }

    if !prefs.ages.is_empty() {
        let hit = prefs.ages.contains(&pet.age);
        tally.score(
            AGE_WEIGHT,
            if hit { AGE_WEIGHT } else { 0 },
            Some(format!("{} age matches your preference", pet.age.as_str())),
        );
    }

    if let Some(wanted) = prefs.energy_level {
        let (credit, reason) = if wanted == pet.energy_level {
            (
                ENERGY_WEIGHT,
                format!("Energy level is {}, just as you wanted", pet.energy_level.as_str()),
            )
        } else if wanted.is_adjacent(&pet.energy_level) {
            (
                ADJACENT_ENERGY_CREDIT,
                format!(
                    "Energy level is close to your preference ({})",
                    pet.energy_level.as_str()
                ),
            )
        } else {
            (0, String::new())
        };
        tally.score(ENERGY_WEIGHT, credit, Some(reason));
    }

    if prefs.location.is_some() || prefs.max_distance_km.is_some() {
        let (credit, reason) = location_credit(pet, prefs);
        tally.score(LOCATION_WEIGHT, credit, reason);
    }

    MatchResult {
        pet_id: pet.id.clone(),
        pet_name: pet.name.clone(),
        match_score: tally.percent(),
        reasons: tally.reasons,
    }
}

fn location_credit(pet: &Pet, prefs: &UserPreferences) -> (u32, Option<String>) {
    if let (Some(max), Some(distance)) = (prefs.max_distance_km, pet.distance_km) {
        if distance <= max {
            return (LOCATION_WEIGHT, Some(format!("Only {:.0} km away", distance)));
        }
        if distance <= max * 2.0 {
            return (
                LOCATION_WEIGHT / 2,
                Some(format!("{:.0} km away, a little past your range", distance)),
            );
        }
        return (0, None);
    }

    match &prefs.location {
        Some(city)
            if !pet.location.is_empty() && pet.location.eq_ignore_ascii_case(city.trim()) =>
        {
            (LOCATION_WEIGHT, Some(format!("Located in {}", pet.location)))
        }
        _ => (0, None),
    }
}

/// Score available pets, drop zero scores, best first. Ties sort by name.
pub fn rank_matches(pets: &[Record<Pet>], prefs: &UserPreferences) -> Vec<MatchResult> {
    let mut results: Vec<MatchResult> = pets
        .iter()
        .filter(|p| p.status == PetStatus::Available)
        .map(|p| calculate_pet_match(p, prefs))
        .filter(|m| m.match_score > 0)
        .collect();
    results.sort_by(|a, b| {
        b.match_score
            .cmp(&a.match_score)
            .then_with(|| a.pet_name.cmp(&b.pet_name))
    });
    results
}

/// Matches pets against the preferences stored for each user.
#[derive(Clone)]
pub struct MatchingService {
    pets: JsonRepository<Pet>,
    preferences: JsonRepository<UserPreferences>,
}

impl MatchingService {
    pub fn new(storage: Storage, pets: JsonRepository<Pet>) -> Self {
        Self {
            pets,
            preferences: JsonRepository::new(storage),
        }
    }

    pub async fn get_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<UserPreferences>, AppError> {
        Ok(self.preferences.get(user_id).await?.map(|r| r.fields))
    }

    /// Store `prefs` as the user's preferences, replacing earlier ones.
    pub async fn save_preferences(
        &self,
        user_id: &str,
        mut prefs: UserPreferences,
    ) -> Result<Record<UserPreferences>, AppError> {
        if user_id.trim().is_empty() {
            return Err(AppError::Validation("User id is required".to_string()));
        }
        if prefs.max_distance_km.is_some_and(|d| d <= 0.0) {
            return Err(AppError::Validation(
                "Maximum distance must be positive".to_string(),
            ));
        }
        prefs.updated_at = chrono::Utc::now().to_rfc3339();
        let saved = self
            .preferences
            .upsert(UserPreferences::for_user(user_id, prefs))
            .await?;
        tracing::info!("Saved preferences for {}", user_id);
        Ok(saved)
    }

    /// Ranked matches for the user. No stored preferences means no matches.
    pub async fn matches_for(&self, user_id: &str) -> Result<Vec<MatchResult>, AppError> {
        let Some(prefs) = self.get_preferences(user_id).await? else {
            tracing::debug!("No preferences stored for {}", user_id);
            return Ok(Vec::new());
        };
        let pets = self.pets.list().await?;
        Ok(rank_matches(&pets, &prefs))
    }

    /// Score one pet for the user.
    pub async fn match_pet(&self, user_id: &str, pet_id: &str) -> Result<MatchResult, AppError> {
        let pet = self
            .pets
            .get(pet_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pet {} not found", pet_id)))?;
        let prefs = self.get_preferences(user_id).await?.unwrap_or_default();
        Ok(calculate_pet_match(&pet, &prefs))
    }
}
