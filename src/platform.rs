//! Everything the platform needs, built once from configuration.

use std::sync::Arc;

use serde::Serialize;

use crate::auth::{resolve_user_id, AuthUser};
use crate::config::{Config, StoreBackend};
use crate::db::ProfileRepository;
use crate::errors::AppError;
use crate::matching::MatchingService;
use crate::models::{
    AdoptionAnalytics, ApplicationStats, DonationStats, EventStats, FacilityStats, FosterStats,
    HealthStats, InventoryStats, PetStats, VaccinationStats, VolunteerStats, WeatherStats,
};
use crate::services::{
    AdoptionService, ApplicationService, DonationService, EventService, FacilityService,
    FosterService, HealthService, InventoryService, PetService, VaccinationService,
    VolunteerService, WeatherService,
};
use crate::store::{MemoryStore, SqliteStore, Storage};

/// Shared state handed to every caller.
#[derive(Clone)]
pub struct Platform {
    pub storage: Storage,
    pub config: Arc<Config>,
    pub pets: PetService,
    pub applications: ApplicationService,
    pub adoptions: AdoptionService,
    pub donations: DonationService,
    pub events: EventService,
    pub facility: FacilityService,
    pub foster: FosterService,
    pub health: HealthService,
    pub inventory: InventoryService,
    pub vaccinations: VaccinationService,
    pub volunteers: VolunteerService,
    pub weather: WeatherService,
    pub matching: MatchingService,
    /// Only available on the SQLite backend
    pub profiles: Option<ProfileRepository>,
}

/// Summary of every family's stats.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub revision: i64,
    pub pets: PetStats,
    pub applications: ApplicationStats,
    pub adoptions: AdoptionAnalytics,
    pub donations: DonationStats,
    pub events: EventStats,
    pub facility: FacilityStats,
    pub foster: FosterStats,
    pub health: HealthStats,
    pub inventory: InventoryStats,
    pub vaccinations: VaccinationStats,
    pub volunteers: VolunteerStats,
    pub weather: WeatherStats,
}

impl Platform {
    /// Open the configured backend and build the services on it.
    pub async fn from_config(config: Config) -> Result<Self, AppError> {
        match config.store {
            StoreBackend::Sqlite => {
                tracing::info!("Opening SQLite store at {:?}", config.db_path);
                let store = SqliteStore::open(&config.db_path).await?;
                let profiles = ProfileRepository::new(store.pool().clone());
                Ok(Self::build(
                    Storage::new(Arc::new(store)),
                    config,
                    Some(profiles),
                ))
            }
            StoreBackend::Memory => {
                tracing::info!("Using in-memory store");
                Ok(Self::build(
                    Storage::new(Arc::new(MemoryStore::new())),
                    config,
                    None,
                ))
            }
        }
    }

    /// Services with their default seeds over an existing storage handle.
    pub fn build(storage: Storage, config: Config, profiles: Option<ProfileRepository>) -> Self {
        let pets = PetService::new(storage.clone());
        let pet_repo = pets.repository().clone();

        Self {
            applications: ApplicationService::new(storage.clone(), pet_repo.clone()),
            adoptions: AdoptionService::new(storage.clone()),
            donations: DonationService::new(storage.clone()),
            events: EventService::new(storage.clone()),
            facility: FacilityService::new(storage.clone()),
            foster: FosterService::new(storage.clone(), pet_repo.clone()),
            health: HealthService::new(storage.clone()),
            inventory: InventoryService::new(storage.clone()),
            vaccinations: VaccinationService::new(storage.clone()),
            volunteers: VolunteerService::new(storage.clone()),
            weather: WeatherService::new(storage.clone()),
            matching: MatchingService::new(storage.clone(), pet_repo),
            pets,
            storage,
            config: Arc::new(config),
            profiles,
        }
    }

    /// The profile repository, or a `Validation` error on the memory backend.
    pub fn profiles(&self) -> Result<&ProfileRepository, AppError> {
        self.profiles.as_ref().ok_or_else(|| {
            AppError::Validation("User profiles need the sqlite store".to_string())
        })
    }

    pub fn user_id(&self, user: Option<&AuthUser>) -> String {
        resolve_user_id(user, &self.config.demo_user_id)
    }

    /// Read every collection once so missing ones get their seed written.
    pub async fn seed_all(&self) -> Result<(), AppError> {
        self.pets.list_pets().await?;
        self.applications.list_applications().await?;
        self.adoptions.list_adoptions().await?;
        self.donations.list_donations().await?;
        self.donations.list_campaigns().await?;
        self.events.list_events().await?;
        self.facility.list_units().await?;
        self.facility.list_requests().await?;
        self.foster.list_foster_parents().await?;
        self.foster.list_placements().await?;
        self.health.list_health_records().await?;
        self.inventory.list_items().await?;
        self.vaccinations.list_vaccinations().await?;
        self.volunteers.list_volunteers().await?;
        self.weather.list_reports().await?;

        let keys = self.storage.backend().keys().await?;
        tracing::info!("Seeded store, {} collections present", keys.len());
        Ok(())
    }

    pub async fn dashboard(&self) -> Result<Dashboard, AppError> {
        Ok(Dashboard {
            pets: self.pets.stats().await?,
            applications: self.applications.stats().await?,
            adoptions: self.adoptions.analytics().await?,
            donations: self.donations.stats().await?,
            events: self.events.stats().await?,
            facility: self.facility.stats().await?,
            foster: self.foster.stats().await?,
            health: self.health.stats().await?,
            inventory: self.inventory.stats().await?,
            vaccinations: self.vaccinations.stats().await?,
            volunteers: self.volunteers.stats().await?,
            weather: self.weather.stats().await?,
            revision: self.storage.backend().revision().await?,
        })
    }
}
