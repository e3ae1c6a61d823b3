//! Facility units and maintenance requests.

use chrono::Utc;

use crate::errors::AppError;
use crate::models::{
    calculate_facility_stats, FacilityStats, FacilityUnit, MaintenanceRequest, MaintenanceStatus,
    Priority, UnitStatus,
};
use crate::repository::ids::counter_id;
use crate::repository::{JsonPatch, JsonRepository, Record};
use crate::store::Storage;

use super::require;

/// Housing units and maintenance.
#[derive(Clone)]
pub struct FacilityService {
    units: JsonRepository<FacilityUnit>,
    requests: JsonRepository<MaintenanceRequest>,
}

impl FacilityService {
    pub fn new(storage: Storage) -> Self {
        Self::with_seed(storage, default_units(), default_maintenance_requests())
    }

    pub fn with_seed(
        storage: Storage,
        units: Vec<Record<FacilityUnit>>,
        requests: Vec<Record<MaintenanceRequest>>,
    ) -> Self {
        Self {
            units: JsonRepository::with_seed(storage.clone(), units),
            requests: JsonRepository::with_seed(storage, requests),
        }
    }

    pub async fn list_units(&self) -> Result<Vec<Record<FacilityUnit>>, AppError> {
        self.units.list().await
    }

    pub async fn get_unit(&self, id: &str) -> Result<Option<Record<FacilityUnit>>, AppError> {
        self.units.get(id).await
    }

    pub async fn add_unit(&self, unit: FacilityUnit) -> Result<String, AppError> {
        require(&unit.name, "Unit name")?;
        if unit.occupied > unit.capacity {
            return Err(AppError::Validation(format!(
                "{} cannot start over capacity",
                unit.name
            )));
        }
        self.units.add(unit).await
    }

    pub async fn update_unit(
        &self,
        id: &str,
        patch: &JsonPatch,
    ) -> Result<Option<Record<FacilityUnit>>, AppError> {
        self.units.update(id, patch).await
    }

    pub async fn delete_unit(&self, id: &str) -> Result<bool, AppError> {
        self.units.delete(id).await
    }

    pub async fn set_occupancy(
        &self,
        id: &str,
        occupied: u32,
    ) -> Result<Option<Record<FacilityUnit>>, AppError> {
        self.units
            .update_with(id, |unit| unit.set_occupancy(occupied))
            .await
    }

    pub async fn list_requests(&self) -> Result<Vec<Record<MaintenanceRequest>>, AppError> {
        self.requests.list().await
    }

    /// Unresolved requests, most urgent first.
    pub async fn open_requests(&self) -> Result<Vec<Record<MaintenanceRequest>>, AppError> {
        let mut open = self
            .requests
            .filter(|r| r.status != MaintenanceStatus::Resolved)
            .await?;
        open.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(open)
    }

    /// Raise a request against an existing unit.
    pub async fn report_issue(&self, request: MaintenanceRequest) -> Result<String, AppError> {
        require(&request.title, "Request title")?;
        if self.units.get(&request.unit_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Unit {} not found",
                request.unit_id
            )));
        }
        self.requests.add(request).await
    }

    pub async fn resolve_request(
        &self,
        id: &str,
    ) -> Result<Option<Record<MaintenanceRequest>>, AppError> {
        let now = Utc::now().to_rfc3339();
        self.requests
            .update_with(id, |request| {
                if request.status == MaintenanceStatus::Resolved {
                    return Ok(());
                }
                request.status = MaintenanceStatus::Resolved;
                request.resolved_at = Some(now);
                Ok(())
            })
            .await
    }

    pub async fn delete_request(&self, id: &str) -> Result<bool, AppError> {
        self.requests.delete(id).await
    }

    pub async fn stats(&self) -> Result<FacilityStats, AppError> {
        let units = self.units.list().await?;
        let requests = self.requests.list().await?;
        Ok(calculate_facility_stats(&units, &requests))
    }
}

pub fn default_units() -> Vec<Record<FacilityUnit>> {
    let rows = [
        ("Dog Kennel Block A", "Dog Wing", 12, 9, UnitStatus::Operational),
        ("Dog Kennel Block B", "Dog Wing", 12, 7, UnitStatus::Operational),
        ("Cattery", "Cat Wing", 20, 14, UnitStatus::Operational),
        ("Small Animal Room", "Annex", 8, 0, UnitStatus::Maintenance),
        ("Isolation Ward", "Clinic", 4, 1, UnitStatus::Operational),
    ];
    rows.into_iter()
        .enumerate()
        .map(|(i, (name, area, capacity, occupied, status))| {
            Record::new(
                counter_id("unit", i + 1),
                FacilityUnit {
                    name: name.to_string(),
                    area: area.to_string(),
                    capacity,
                    occupied,
                    status,
                    last_inspected: "2024-04-01".to_string(),
                },
            )
        })
        .collect()
}

pub fn default_maintenance_requests() -> Vec<Record<MaintenanceRequest>> {
    vec![
        Record::new(
            counter_id("maint", 1),
            MaintenanceRequest {
                unit_id: "unit-4".to_string(),
                title: "Replace ventilation fan".to_string(),
                priority: Priority::High,
                status: MaintenanceStatus::InProgress,
                reported_at: "2024-04-18T08:00:00Z".to_string(),
                resolved_at: None,
            },
        ),
        Record::new(
            counter_id("maint", 2),
            MaintenanceRequest {
                unit_id: "unit-1".to_string(),
                title: "Loose gate latch on run 3".to_string(),
                priority: Priority::Medium,
                status: MaintenanceStatus::Open,
                reported_at: "2024-04-25T13:20:00Z".to_string(),
                resolved_at: None,
            },
        ),
        Record::new(
            counter_id("maint", 3),
            MaintenanceRequest {
                unit_id: "unit-3".to_string(),
                title: "Repaint feeding area".to_string(),
                priority: Priority::Low,
                status: MaintenanceStatus::Resolved,
                reported_at: "2024-03-02T10:00:00Z".to_string(),
                resolved_at: Some("2024-03-09T16:00:00Z".to_string()),
            },
        ),
    ]
}
