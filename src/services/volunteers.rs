//! Volunteers and logged shifts.

use crate::errors::AppError;
use crate::models::{
    calculate_volunteer_stats, Volunteer, VolunteerShift, VolunteerStats, VolunteerStatus,
};
use crate::repository::ids::counter_id;
use crate::repository::{JsonPatch, JsonRepository, Record};
use crate::stats::{round2, sort_by_date_desc};
use crate::store::Storage;

use super::require;

/// Volunteers and shift logging.
#[derive(Clone)]
pub struct VolunteerService {
    volunteers: JsonRepository<Volunteer>,
    shifts: JsonRepository<VolunteerShift>,
}

impl VolunteerService {
    pub fn new(storage: Storage) -> Self {
        Self::with_seed(storage, default_volunteers(), Vec::new())
    }

    pub fn with_seed(
        storage: Storage,
        volunteers: Vec<Record<Volunteer>>,
        shifts: Vec<Record<VolunteerShift>>,
    ) -> Self {
        Self {
            volunteers: JsonRepository::with_seed(storage.clone(), volunteers),
            shifts: JsonRepository::with_seed(storage, shifts),
        }
    }

    pub async fn list_volunteers(&self) -> Result<Vec<Record<Volunteer>>, AppError> {
        self.volunteers.list().await
    }

    pub async fn get_volunteer(&self, id: &str) -> Result<Option<Record<Volunteer>>, AppError> {
        self.volunteers.get(id).await
    }

    pub async fn add_volunteer(&self, volunteer: Volunteer) -> Result<String, AppError> {
        require(&volunteer.name, "Volunteer name")?;
        require(&volunteer.email, "Volunteer email")?;
        self.volunteers.add(volunteer).await
    }

    pub async fn update_volunteer(
        &self,
        id: &str,
        patch: &JsonPatch,
    ) -> Result<Option<Record<Volunteer>>, AppError> {
        self.volunteers.update(id, patch).await
    }

    pub async fn delete_volunteer(&self, id: &str) -> Result<bool, AppError> {
        self.volunteers.delete(id).await
    }

    /// Store a shift and add its hours to the volunteer's total.
    pub async fn log_shift(&self, shift: VolunteerShift) -> Result<String, AppError> {
        shift.validate()?;
        let volunteer = self
            .volunteers
            .get(&shift.volunteer_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Volunteer {} not found", shift.volunteer_id))
            })?;
        if volunteer.status == VolunteerStatus::Inactive {
            return Err(AppError::Validation(format!(
                "{} is inactive",
                volunteer.name
            )));
        }

        let hours = shift.hours;
        let volunteer_id = shift.volunteer_id.clone();
        let id = self.shifts.add(shift).await?;
        self.volunteers
            .update_with(&volunteer_id, |volunteer| {
                volunteer.hours_logged = round2(volunteer.hours_logged + hours);
                Ok(())
            })
            .await?;

        tracing::info!("Logged {} hours for {}", hours, volunteer_id);
        Ok(id)
    }

    /// Shifts of one volunteer, newest first.
    pub async fn shifts_for(
        &self,
        volunteer_id: &str,
    ) -> Result<Vec<Record<VolunteerShift>>, AppError> {
        let mut shifts = self
            .shifts
            .filter(|s| s.volunteer_id == volunteer_id)
            .await?;
        sort_by_date_desc(&mut shifts, |s| s.date.as_str());
        Ok(shifts)
    }

    pub async fn stats(&self) -> Result<VolunteerStats, AppError> {
        let volunteers = self.volunteers.list().await?;
        let shifts = self.shifts.list().await?;
        Ok(calculate_volunteer_stats(&volunteers, &shifts))
    }
}

pub fn default_volunteers() -> Vec<Record<Volunteer>> {
    let rows = [
        (
            "Grace Kim",
            &["dog walking", "photography"][..],
            VolunteerStatus::Active,
            126.5,
            "2022-05-01",
        ),
        ("Daniel Ortiz", &["cat socializing"][..], VolunteerStatus::Active, 88.0, "2023-01-14"),
        (
            "Nora Haddad",
            &["events", "fundraising"][..],
            VolunteerStatus::Onboarding,
            4.0,
            "2024-04-10",
        ),
        ("Peter Novak", &["transport"][..], VolunteerStatus::Inactive, 42.25, "2021-09-30"),
    ];
    rows.into_iter()
        .enumerate()
        .map(|(i, (name, skills, status, hours, joined))| {
            Record::new(
                counter_id("vol", i + 1),
                Volunteer {
                    name: name.to_string(),
                    email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
                    phone: String::new(),
                    skills: skills.iter().map(|s| s.to_string()).collect(),
                    availability: vec!["weekends".to_string()],
                    status,
                    hours_logged: hours,
                    joined_at: joined.to_string(),
                },
            )
        })
        .collect()
}
