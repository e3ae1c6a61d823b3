//! Vet visits, treatments and other health history.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::repository::{Entity, Record};
use crate::stats::{
    breakdown, monthly_trend, parse_date, round2, sort_by_date_desc, MonthlyCount, TREND_MONTHS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthRecordKind {
    Checkup,
    Treatment,
    Surgery,
    Dental,
    Emergency,
}

impl HealthRecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthRecordKind::Checkup => "checkup",
            HealthRecordKind::Treatment => "treatment",
            HealthRecordKind::Surgery => "surgery",
            HealthRecordKind::Dental => "dental",
            HealthRecordKind::Emergency => "emergency",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    pub pet_id: String,
    pub pet_name: String,
    pub kind: HealthRecordKind,
    pub date: String,
    pub veterinarian: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub treatment: String,
    #[serde(default)]
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<String>,
}

impl Entity for HealthRecord {
    const ID_PREFIX: &'static str = "health";
    const STORAGE_KEY: &'static str = "health_records";

    fn on_create(&mut self, now: &str) {
        if self.date.is_empty() {
            self.date = now.to_string();
        }
    }
}

/// Records of one pet, newest first.
pub fn pet_history(records: &[Record<HealthRecord>], pet_id: &str) -> Vec<Record<HealthRecord>> {
    let mut history: Vec<Record<HealthRecord>> = records
        .iter()
        .filter(|r| r.pet_id == pet_id)
        .cloned()
        .collect();
    sort_by_date_desc(&mut history, |r| r.date.as_str());
    history
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStats {
    pub total_records: usize,
    pub pets_tracked: usize,
    pub by_kind: BTreeMap<String, usize>,
    pub total_cost: f64,
    pub upcoming_follow_ups: usize,
    pub overdue_follow_ups: usize,
    pub monthly_trend: Vec<MonthlyCount>,
}

pub fn calculate_health_stats(records: &[Record<HealthRecord>], today: NaiveDate) -> HealthStats {
    let mut pets: Vec<&str> = records.iter().map(|r| r.pet_id.as_str()).collect();
    pets.sort_unstable();
    pets.dedup();

    let follow_ups: Vec<NaiveDate> = records
        .iter()
        .filter_map(|r| r.follow_up_date.as_deref())
        .filter_map(parse_date)
        .collect();

    HealthStats {
        total_records: records.len(),
        pets_tracked: pets.len(),
        by_kind: breakdown(records.iter().map(|r| r.kind.as_str())),
        total_cost: round2(records.iter().map(|r| r.cost).sum()),
        upcoming_follow_ups: follow_ups.iter().filter(|d| **d >= today).count(),
        overdue_follow_ups: follow_ups.iter().filter(|d| **d < today).count(),
        monthly_trend: monthly_trend(records.iter().map(|r| r.date.as_str()), TREND_MONTHS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        pet_id: &str,
        date: &str,
        cost: f64,
        follow_up: Option<&str>,
    ) -> Record<HealthRecord> {
        Record::new(
            format!("health-{}-{}", pet_id, date),
            HealthRecord {
                pet_id: pet_id.to_string(),
                pet_name: "Biscuit".to_string(),
                kind: HealthRecordKind::Checkup,
                date: date.to_string(),
                veterinarian: "Dr. Patel".to_string(),
                diagnosis: String::new(),
                treatment: String::new(),
                cost,
                follow_up_date: follow_up.map(str::to_string),
            },
        )
    }

    #[test]
    fn test_pet_history_newest_first() {
        let records = vec![
            record("pet-1", "2024-01-10", 0.0, None),
            record("pet-2", "2024-02-10", 0.0, None),
            record("pet-1", "2024-03-10", 0.0, None),
        ];
        let history = pet_history(&records, "pet-1");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, "2024-03-10");
    }

    #[test]
    fn test_health_stats() {
        let today = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let records = vec![
            record("pet-1", "2024-01-10", 80.0, Some("2024-03-01")),
            record("pet-2", "2024-02-10", 120.5, Some("2024-05-01")),
            record("pet-1", "2024-03-10", 45.25, None),
        ];
        let stats = calculate_health_stats(&records, today);
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.pets_tracked, 2);
        assert_eq!(stats.total_cost, 245.75);
        assert_eq!(stats.upcoming_follow_ups, 1);
        assert_eq!(stats.overdue_follow_ups, 1);
        assert_eq!(stats.monthly_trend.len(), 3);
    }
}
