//! Shelter events and attendee registration.

use crate::errors::AppError;
use crate::models::{calculate_event_stats, EventKind, EventStats, EventStatus, ShelterEvent};
use crate::repository::ids::counter_id;
use crate::repository::{JsonPatch, JsonRepository, Record};
use crate::stats::parse_date;
use crate::store::Storage;

use super::{days_from_today, require, today};

/// Shelter events and registrations.
#[derive(Clone)]
pub struct EventService {
    events: JsonRepository<ShelterEvent>,
}

impl EventService {
    pub fn new(storage: Storage) -> Self {
        Self::with_seed(storage, default_events())
    }

    pub fn with_seed(storage: Storage, seed: Vec<Record<ShelterEvent>>) -> Self {
        Self {
            events: JsonRepository::with_seed(storage, seed),
        }
    }

    pub async fn list_events(&self) -> Result<Vec<Record<ShelterEvent>>, AppError> {
        self.events.list().await
    }

    pub async fn get_event(&self, id: &str) -> Result<Option<Record<ShelterEvent>>, AppError> {
        self.events.get(id).await
    }

    pub async fn add_event(&self, event: ShelterEvent) -> Result<String, AppError> {
        require(&event.title, "Event title")?;
        if parse_date(&event.date).is_none() {
            return Err(AppError::Validation(format!(
                "Event date '{}' is not a valid date",
                event.date
            )));
        }
        self.events.add(event).await
    }

    pub async fn update_event(
        &self,
        id: &str,
        patch: &JsonPatch,
    ) -> Result<Option<Record<ShelterEvent>>, AppError> {
        self.events.update(id, patch).await
    }

    pub async fn delete_event(&self, id: &str) -> Result<bool, AppError> {
        self.events.delete(id).await
    }

    /// Take one registration. Full or closed events are a `Validation` error.
    pub async fn register_attendee(
        &self,
        id: &str,
    ) -> Result<Option<Record<ShelterEvent>>, AppError> {
        self.events.update_with(id, |event| event.register()).await
    }

    pub async fn cancel_event(&self, id: &str) -> Result<Option<Record<ShelterEvent>>, AppError> {
        self.events
            .update_with(id, |event| {
                event.status = EventStatus::Cancelled;
                Ok(())
            })
            .await
    }

    /// Scheduled events from today on, soonest first.
    pub async fn upcoming_events(&self) -> Result<Vec<Record<ShelterEvent>>, AppError> {
        let today = today();
        let mut events = self
            .events
            .filter(|e| {
                e.status == EventStatus::Upcoming
                    && parse_date(&e.date).is_some_and(|d| d >= today)
            })
            .await?;
        events.sort_by(|a, b| parse_date(&a.date).cmp(&parse_date(&b.date)));
        Ok(events)
    }

    pub async fn stats(&self) -> Result<EventStats, AppError> {
        Ok(calculate_event_stats(&self.events.list().await?, today()))
    }
}

pub fn default_events() -> Vec<Record<ShelterEvent>> {
    let orientation = days_from_today(21);
    let workshop = days_from_today(35);
    let rows = [
        (
            "Spring Adoption Day",
            EventKind::AdoptionDay,
            "2024-04-13",
            200,
            200,
            EventStatus::Completed,
        ),
        (
            "Paws & Pancakes Fundraiser",
            EventKind::Fundraiser,
            "2024-05-18",
            120,
            96,
            EventStatus::Completed,
        ),
        (
            "New Volunteer Orientation",
            EventKind::VolunteerOrientation,
            orientation.as_str(),
            25,
            11,
            EventStatus::Upcoming,
        ),
        (
            "Puppy Training Basics",
            EventKind::Workshop,
            workshop.as_str(),
            15,
            15,
            EventStatus::Upcoming,
        ),
    ];
    rows.into_iter()
        .enumerate()
        .map(|(i, (title, kind, date, capacity, registered, status))| {
            Record::new(
                counter_id("evt", i + 1),
                ShelterEvent {
                    title: title.to_string(),
                    kind,
                    date: date.to_string(),
                    location: "PawHaven Main Shelter".to_string(),
                    capacity,
                    registered,
                    status,
                    description: String::new(),
                },
            )
        })
        .collect()
}
