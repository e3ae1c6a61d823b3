//! Vaccination records and due-date tracking.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::repository::{Entity, Record};
use crate::stats::{parse_date, percentage};

/// Window before a due date in which a vaccine counts as due soon.
pub const DUE_SOON_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DueStatus {
    Current,
    DueSoon,
    Overdue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vaccination {
    pub pet_id: String,
    pub pet_name: String,
    pub vaccine: String,
    pub administered_on: String,
    pub next_due: String,
    #[serde(default)]
    pub administered_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<String>,
}

impl Vaccination {
    /// An unreadable due date is treated as overdue.
    pub fn due_status(&self, today: NaiveDate) -> DueStatus {
        let Some(due) = parse_date(&self.next_due) else {
            return DueStatus::Overdue;
        };
        let days_left = (due - today).num_days();
        if days_left < 0 {
            DueStatus::Overdue
        } else if days_left <= DUE_SOON_DAYS {
            DueStatus::DueSoon
        } else {
            DueStatus::Current
        }
    }
}

impl Entity for Vaccination {
    const ID_PREFIX: &'static str = "vax";
    const STORAGE_KEY: &'static str = "vaccinations";

    fn on_create(&mut self, now: &str) {
        if self.administered_on.is_empty() {
            self.administered_on = now.to_string();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccinationStats {
    pub total: usize,
    pub current: usize,
    pub due_soon: usize,
    pub overdue: usize,
    pub compliance_rate: f64,
}

/// Vaccinations due within [`DUE_SOON_DAYS`] or already overdue.
pub fn due_vaccinations(
    records: &[Record<Vaccination>],
    today: NaiveDate,
) -> Vec<Record<Vaccination>> {
    records
        .iter()
        .filter(|r| r.due_status(today) != DueStatus::Current)
        .cloned()
        .collect()
}

/// Compliance counts everything not overdue.
pub fn calculate_vaccination_stats(
    records: &[Record<Vaccination>],
    today: NaiveDate,
) -> VaccinationStats {
    let count = |status: DueStatus| {
        records
            .iter()
            .filter(|r| r.due_status(today) == status)
            .count()
    };
    let current = count(DueStatus::Current);
    let due_soon = count(DueStatus::DueSoon);

    VaccinationStats {
        total: records.len(),
        current,
        due_soon,
        overdue: count(DueStatus::Overdue),
        compliance_rate: percentage(current + due_soon, records.len()),
    }
}
