//! Kennels, catteries and the maintenance requests raised against them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::repository::{Entity, Record};
use crate::stats::{breakdown, percentage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Operational,
    Maintenance,
    Closed,
}

impl UnitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitStatus::Operational => "operational",
            UnitStatus::Maintenance => "maintenance",
            UnitStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityUnit {
    pub name: String,
    pub area: String,
    pub capacity: u32,
    #[serde(default)]
    pub occupied: u32,
    pub status: UnitStatus,
    #[serde(default)]
    pub last_inspected: String,
}

impl FacilityUnit {
    pub fn set_occupancy(&mut self, occupied: u32) -> Result<(), AppError> {
        if occupied > self.capacity {
            return Err(AppError::Validation(format!(
                "{} holds at most {} animals",
                self.name, self.capacity
            )));
        }
        if occupied > 0 && self.status == UnitStatus::Closed {
            return Err(AppError::Validation(format!("{} is closed", self.name)));
        }
        self.occupied = occupied;
        Ok(())
    }
}

impl Entity for FacilityUnit {
    const ID_PREFIX: &'static str = "unit";
    const STORAGE_KEY: &'static str = "facility_units";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaintenanceStatus {
    Open,
    InProgress,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRequest {
    pub unit_id: String,
    pub title: String,
    pub priority: Priority,
    pub status: MaintenanceStatus,
    #[serde(default)]
    pub reported_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
}

impl Entity for MaintenanceRequest {
    const ID_PREFIX: &'static str = "maint";
    const STORAGE_KEY: &'static str = "maintenance_requests";

    fn on_create(&mut self, now: &str) {
        if self.reported_at.is_empty() {
            self.reported_at = now.to_string();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityStats {
    pub total_units: usize,
    pub by_status: BTreeMap<String, usize>,
    pub total_capacity: u32,
    pub occupied: u32,
    pub available_spaces: u32,
    pub occupancy_rate: f64,
    pub open_requests: usize,
    pub open_by_priority: BTreeMap<String, usize>,
}

/// Capacity counts only operational units.
pub fn calculate_facility_stats(
    units: &[Record<FacilityUnit>],
    requests: &[Record<MaintenanceRequest>],
) -> FacilityStats {
    let operational: Vec<&Record<FacilityUnit>> = units
        .iter()
        .filter(|u| u.status == UnitStatus::Operational)
        .collect();
    let total_capacity: u32 = operational.iter().map(|u| u.capacity).sum();
    let occupied: u32 = operational.iter().map(|u| u.occupied).sum();

    let open: Vec<&Record<MaintenanceRequest>> = requests
        .iter()
        .filter(|r| r.status != MaintenanceStatus::Resolved)
        .collect();

    FacilityStats {
        total_units: units.len(),
        by_status: breakdown(units.iter().map(|u| u.status.as_str())),
        total_capacity,
        occupied,
        available_spaces: total_capacity.saturating_sub(occupied),
        occupancy_rate: percentage(occupied as usize, total_capacity as usize),
        open_requests: open.len(),
        open_by_priority: breakdown(open.iter().map(|r| r.priority.as_str())),
    }
}
