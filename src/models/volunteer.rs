//! Volunteers and their logged shifts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::repository::{Entity, Record};
use crate::stats::{breakdown, round2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolunteerStatus {
    Active,
    Inactive,
    Onboarding,
}

impl VolunteerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolunteerStatus::Active => "active",
            VolunteerStatus::Inactive => "inactive",
            VolunteerStatus::Onboarding => "onboarding",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volunteer {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub availability: Vec<String>,
    pub status: VolunteerStatus,
    #[serde(default)]
    pub hours_logged: f64,
    #[serde(default)]
    pub joined_at: String,
}

impl Entity for Volunteer {
    const ID_PREFIX: &'static str = "vol";
    const STORAGE_KEY: &'static str = "volunteers";

    fn on_create(&mut self, now: &str) {
        if self.joined_at.is_empty() {
            self.joined_at = now.to_string();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerShift {
    pub volunteer_id: String,
    pub date: String,
    pub hours: f64,
    pub task: String,
    #[serde(default)]
    pub notes: String,
}

impl VolunteerShift {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.hours > 0.0 && self.hours <= 24.0) {
            return Err(AppError::Validation(format!(
                "Shift length must be between 0 and 24 hours, got {}",
                self.hours
            )));
        }
        Ok(())
    }
}

impl Entity for VolunteerShift {
    const ID_PREFIX: &'static str = "shift";
    const STORAGE_KEY: &'static str = "volunteer_shifts";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerHours {
    pub volunteer_id: String,
    pub name: String,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerStats {
    pub total: usize,
    pub active: usize,
    pub by_status: BTreeMap<String, usize>,
    pub total_hours: f64,
    pub shifts_logged: usize,
    pub top_volunteers: Vec<VolunteerHours>,
}

/// Number of volunteers listed in [`VolunteerStats::top_volunteers`].
pub const TOP_VOLUNTEERS: usize = 5;

pub fn calculate_volunteer_stats(
    volunteers: &[Record<Volunteer>],
    shifts: &[Record<VolunteerShift>],
) -> VolunteerStats {
    let mut top: Vec<VolunteerHours> = volunteers
        .iter()
        .map(|v| VolunteerHours {
            volunteer_id: v.id.clone(),
            name: v.name.clone(),
            hours: round2(v.hours_logged),
        })
        .collect();
    top.sort_by(|a, b| b.hours.total_cmp(&a.hours).then_with(|| a.name.cmp(&b.name)));
    top.truncate(TOP_VOLUNTEERS);

    VolunteerStats {
        total: volunteers.len(),
        active: volunteers
            .iter()
            .filter(|v| v.status == VolunteerStatus::Active)
            .count(),
        by_status: breakdown(volunteers.iter().map(|v| v.status.as_str())),
        total_hours: round2(volunteers.iter().map(|v| v.hours_logged).sum()),
        shifts_logged: shifts.len(),
        top_volunteers: top,
    }
}
