//! Shelter events: adoption days, fundraisers, workshops.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::repository::{Entity, Record};
use crate::stats::{breakdown, parse_date, ratio_percent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    AdoptionDay,
    Fundraiser,
    Workshop,
    VolunteerOrientation,
    Other,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::AdoptionDay => "adoption-day",
            EventKind::Fundraiser => "fundraiser",
            EventKind::Workshop => "workshop",
            EventKind::VolunteerOrientation => "volunteer-orientation",
            EventKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelterEvent {
    pub title: String,
    pub kind: EventKind,
    /// `YYYY-MM-DD`
    pub date: String,
    pub location: String,
    pub capacity: u32,
    #[serde(default)]
    pub registered: u32,
    pub status: EventStatus,
    #[serde(default)]
    pub description: String,
}

impl ShelterEvent {
    /// Take one more registration.
    pub fn register(&mut self) -> Result<(), AppError> {
        if self.status != EventStatus::Upcoming {
            return Err(AppError::Validation(format!(
                "Event '{}' is {} and not taking registrations",
                self.title,
                self.status.as_str()
            )));
        }
        if self.registered >= self.capacity {
            return Err(AppError::Validation(format!(
                "Event '{}' is full",
                self.title
            )));
        }
        self.registered += 1;
        Ok(())
    }

    pub fn spots_left(&self) -> u32 {
        self.capacity.saturating_sub(self.registered)
    }
}

impl Entity for ShelterEvent {
    const ID_PREFIX: &'static str = "evt";
    const STORAGE_KEY: &'static str = "shelter_events";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub total: usize,
    pub upcoming: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_kind: BTreeMap<String, usize>,
    pub total_registered: u32,
    pub fill_rate: f64,
}

/// `upcoming` counts events still scheduled on or after `today`.
pub fn calculate_event_stats(events: &[Record<ShelterEvent>], today: NaiveDate) -> EventStats {
    let upcoming = events
        .iter()
        .filter(|e| e.status == EventStatus::Upcoming)
        .filter(|e| parse_date(&e.date).is_some_and(|d| d >= today))
        .count();

    let live: Vec<&Record<ShelterEvent>> = events
        .iter()
        .filter(|e| e.status != EventStatus::Cancelled)
        .collect();
    let registered: u32 = live.iter().map(|e| e.registered).sum();
    let capacity: u32 = live.iter().map(|e| e.capacity).sum();

    EventStats {
        total: events.len(),
        upcoming,
        by_status: breakdown(events.iter().map(|e| e.status.as_str())),
        by_kind: breakdown(events.iter().map(|e| e.kind.as_str())),
        total_registered: registered,
        fill_rate: ratio_percent(f64::from(registered), f64::from(capacity)),
    }
}
