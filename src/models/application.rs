//! Adoption application model and its status workflow.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::repository::{Entity, Record};
use crate::stats::{breakdown, percentage};

/// Where an application is in the review workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    Pending,
    Interview,
    HomeVisit,
    Approved,
    Completed,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Interview,
        ApplicationStatus::HomeVisit,
        ApplicationStatus::Approved,
        ApplicationStatus::Completed,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::HomeVisit => "home-visit",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Completed => "completed",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// States reachable in one step.
    pub fn allowed_next_states(&self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        match self {
            Pending => &[Interview, HomeVisit, Approved, Rejected],
            Interview => &[HomeVisit, Approved, Rejected],
            HomeVisit => &[Approved, Rejected],
            Approved => &[Completed, Rejected],
            Completed | Rejected => &[],
        }
    }

    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        self.allowed_next_states().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_next_states().is_empty()
    }
}

/// One entry in an application's status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: ApplicationStatus,
    pub at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdoptionApplication {
    pub pet_id: String,
    pub pet_name: String,
    pub adopter_id: String,
    pub adopter_name: String,
    pub adopter_email: String,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub home_type: String,
    #[serde(default)]
    pub has_yard: bool,
    #[serde(default)]
    pub other_pets: bool,
    #[serde(default)]
    pub experience: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub timeline: Vec<StatusChange>,
    #[serde(default)]
    pub submitted_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl AdoptionApplication {
    /// Move to `next`, recording it in the timeline.
    ///
    /// Re-setting the current status changes nothing and returns `Ok(false)`.
    pub fn transition(
        &mut self,
        next: ApplicationStatus,
        note: Option<String>,
        at: &str,
    ) -> Result<bool, AppError> {
        if self.status == next {
            return Ok(false);
        }
        if !self.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                from: self.status.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }

        self.status = next;
        if note.is_some() {
            self.notes = note.clone();
        }
        self.timeline.push(StatusChange {
            status: next,
            at: at.to_string(),
            note,
        });
        Ok(true)
    }
}

impl Entity for AdoptionApplication {
    const ID_PREFIX: &'static str = "app";
    const STORAGE_KEY: &'static str = "adoption_applications";

    fn on_create(&mut self, now: &str) {
        if self.submitted_at.is_empty() {
            self.submitted_at = now.to_string();
        }
        self.updated_at = self.submitted_at.clone();
        if self.timeline.is_empty() {
            self.timeline.push(StatusChange {
                status: self.status,
                at: self.submitted_at.clone(),
                note: None,
            });
        }
    }

    fn touch(&mut self, now: &str) {
        self.updated_at = now.to_string();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub in_review: usize,
    pub approval_rate: f64,
    pub completion_rate: f64,
    pub rejection_rate: f64,
}

pub fn calculate_application_stats(
    applications: &[Record<AdoptionApplication>],
) -> ApplicationStats {
    let count = |wanted: &[ApplicationStatus]| {
        applications
            .iter()
            .filter(|a| wanted.contains(&a.status))
            .count()
    };

    let total = applications.len();
    let approved = count(&[ApplicationStatus::Approved, ApplicationStatus::Completed]);
    let completed = count(&[ApplicationStatus::Completed]);
    let rejected = count(&[ApplicationStatus::Rejected]);
    let in_review = count(&[
        ApplicationStatus::Pending,
        ApplicationStatus::Interview,
        ApplicationStatus::HomeVisit,
    ]);

    ApplicationStats {
        total,
        by_status: breakdown(applications.iter().map(|a| a.status.as_str())),
        in_review,
        approval_rate: percentage(approved, total),
        completion_rate: percentage(completed, total),
        rejection_rate: percentage(rejected, total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    fn application(status: ApplicationStatus) -> AdoptionApplication {
        AdoptionApplication {
            pet_id: "pet-1".to_string(),
            pet_name: "Buddy".to_string(),
            adopter_id: "demo-user".to_string(),
            adopter_name: "Sam Lee".to_string(),
            adopter_email: "sam@example.com".to_string(),
            status,
            home_type: "house".to_string(),
            has_yard: true,
            other_pets: false,
            experience: "Grew up with dogs".to_string(),
            notes: None,
            timeline: Vec::new(),
            submitted_at: "2024-05-01T09:00:00Z".to_string(),
            updated_at: "2024-05-01T09:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_value(HomeVisit).unwrap(), "home-visit");
        assert_eq!(ApplicationStatus::parse("home-visit"), Some(HomeVisit));
        assert_eq!(ApplicationStatus::parse("archived"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(Completed.is_terminal());
        assert!(Rejected.is_terminal());
        assert!(!Approved.is_terminal());
        for status in ApplicationStatus::ALL {
            assert!(!status.can_transition_to(Pending));
        }
    }

    #[test]
    fn test_transition_records_timeline() {
        let mut app = application(Pending);
        assert!(app
            .transition(Interview, Some("Call booked".to_string()), "2024-05-02T10:00:00Z")
            .unwrap());
        assert_eq!(app.status, Interview);
        assert_eq!(app.notes.as_deref(), Some("Call booked"));
        assert_eq!(app.timeline.len(), 1);
        assert_eq!(app.timeline[0].status, Interview);
    }

    #[test]
    fn test_transition_rejects_backwards_move() {
        let mut app = application(Completed);
        let err = app.transition(Pending, None, "2024-05-02T10:00:00Z").unwrap_err();
        assert_eq!(
            err,
            AppError::InvalidTransition {
                from: "completed".to_string(),
                to: "pending".to_string(),
            }
        );
        assert_eq!(app.status, Completed);
    }

    #[test]
    fn test_same_status_is_noop() {
        let mut app = application(Interview);
        assert!(!app.transition(Interview, None, "2024-05-02T10:00:00Z").unwrap());
        assert!(app.timeline.is_empty());
    }

    #[test]
    fn test_on_create_starts_timeline() {
        let mut app = application(Pending);
        app.submitted_at.clear();
        app.on_create("2024-06-01T00:00:00Z");
        assert_eq!(app.submitted_at, "2024-06-01T00:00:00Z");
        assert_eq!(app.timeline.len(), 1);
        assert_eq!(app.timeline[0].status, Pending);
    }

    #[test]
    fn test_application_stats() {
        let apps: Vec<Record<AdoptionApplication>> = [Pending, Approved, Completed, Rejected]
            .into_iter()
            .enumerate()
            .map(|(i, s)| Record::new(format!("app-{}", i), application(s)))
            .collect();

        let stats = calculate_application_stats(&apps);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.in_review, 1);
        assert_eq!(stats.approval_rate, 50.0);
        assert_eq!(stats.completion_rate, 25.0);
        assert_eq!(stats.rejection_rate, 25.0);
        assert_eq!(stats.by_status.values().sum::<usize>(), 4);
    }
}
