//! Adoption application intake and status changes.

use chrono::Utc;

use crate::errors::AppError;
use crate::models::{
    calculate_application_stats, AdoptionApplication, ApplicationStats, ApplicationStatus, Pet,
    PetStatus, StatusChange,
};
use crate::repository::ids::counter_id;
use crate::repository::{JsonPatch, JsonRepository, Record};
use crate::stats::sort_by_date_desc;
use crate::store::Storage;

use super::require;

/// What an adopter fills in to apply for a pet.
#[derive(Debug, Clone, Default)]
pub struct ApplicationForm {
    pub pet_id: String,
    pub adopter_id: String,
    pub adopter_name: String,
    pub adopter_email: String,
    pub home_type: String,
    pub has_yard: bool,
    pub other_pets: bool,
    pub experience: String,
    pub notes: Option<String>,
}

/// Adoption applications and their review workflow.
#[derive(Clone)]
pub struct ApplicationService {
    storage: Storage,
    applications: JsonRepository<AdoptionApplication>,
    pets: JsonRepository<Pet>,
}

impl ApplicationService {
    pub fn new(storage: Storage, pets: JsonRepository<Pet>) -> Self {
        Self::with_seed(storage, pets, default_applications())
    }

    pub fn with_seed(
        storage: Storage,
        pets: JsonRepository<Pet>,
        seed: Vec<Record<AdoptionApplication>>,
    ) -> Self {
        Self {
            applications: JsonRepository::with_seed(storage.clone(), seed),
            storage,
            pets,
        }
    }

    /// All applications, newest submission first.
    pub async fn list_applications(&self) -> Result<Vec<Record<AdoptionApplication>>, AppError> {
        let mut applications = self.applications.list().await?;
        sort_by_date_desc(&mut applications, |a| a.submitted_at.as_str());
        Ok(applications)
    }

    pub async fn get_application(
        &self,
        id: &str,
    ) -> Result<Option<Record<AdoptionApplication>>, AppError> {
        self.applications.get(id).await
    }

    pub async fn applications_for_adopter(
        &self,
        adopter_id: &str,
    ) -> Result<Vec<Record<AdoptionApplication>>, AppError> {
        let mut applications = self
            .applications
            .filter(|a| a.adopter_id == adopter_id)
            .await?;
        sort_by_date_desc(&mut applications, |a| a.submitted_at.as_str());
        Ok(applications)
    }

    /// Store a new pending application for an available pet.
    pub async fn submit_application(&self, form: ApplicationForm) -> Result<String, AppError> {
        require(&form.adopter_id, "Adopter id")?;
        require(&form.adopter_name, "Adopter name")?;
        require(&form.adopter_email, "Adopter email")?;

        let pet = self
            .pets
            .get(&form.pet_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pet {} not found", form.pet_id)))?;
        if pet.status != PetStatus::Available {
            return Err(AppError::Validation(format!(
                "{} is {} and not open for applications",
                pet.name,
                pet.status.as_str()
            )));
        }

        let application = AdoptionApplication {
            pet_id: pet.id.clone(),
            pet_name: pet.name.clone(),
            adopter_id: form.adopter_id,
            adopter_name: form.adopter_name,
            adopter_email: form.adopter_email,
            status: ApplicationStatus::Pending,
            home_type: form.home_type,
            has_yard: form.has_yard,
            other_pets: form.other_pets,
            experience: form.experience,
            notes: form.notes,
            timeline: Vec::new(),
            submitted_at: String::new(),
            updated_at: String::new(),
        };
        self.applications.add(application).await
    }

    pub async fn update_application(
        &self,
        id: &str,
        patch: &JsonPatch,
    ) -> Result<Option<Record<AdoptionApplication>>, AppError> {
        if patch_touches_status(patch) {
            return Err(AppError::Validation(
                "Use update_application_status to change the status".to_string(),
            ));
        }
        self.applications.update(id, patch).await
    }

    /// Move an application through the review workflow.
    ///
    /// Setting the current status again succeeds without writing. Approval
    /// puts the pet on hold; completion marks it adopted.
    pub async fn update_application_status(
        &self,
        id: &str,
        next: ApplicationStatus,
        note: Option<String>,
    ) -> Result<Option<Record<AdoptionApplication>>, AppError> {
        // Held across the application write and the pet write that follows it
        let _workflow = self
            .storage
            .locks()
            .lock(&format!("{}/{}", self.applications.key(), id))
            .await;

        let Some(current) = self.applications.get(id).await? else {
            return Ok(None);
        };
        if current.status == next {
            tracing::debug!("Application {} already {}", id, next.as_str());
            return Ok(Some(current));
        }

        // The status the write actually moved from, read under the key lock
        let mut moved_from = None;
        let now = Utc::now().to_rfc3339();
        let updated = self
            .applications
            .update_with(id, |application| {
                let previous = application.status;
                if application.transition(next, note, &now)? {
                    moved_from = Some(previous);
                }
                Ok(())
            })
            .await?;

        let Some(updated) = updated else {
            return Ok(None);
        };
        let Some(previous) = moved_from else {
            tracing::debug!("Application {} already {}", id, next.as_str());
            return Ok(Some(updated));
        };
        tracing::info!(
            "Application {} moved {} -> {}",
            id,
            previous.as_str(),
            next.as_str()
        );

        let pet_status = match next {
            ApplicationStatus::Approved => Some(PetStatus::Pending),
            ApplicationStatus::Completed => Some(PetStatus::Adopted),
            ApplicationStatus::Rejected if previous == ApplicationStatus::Approved => {
                Some(PetStatus::Available)
            }
            _ => None,
        };
        if let Some(status) = pet_status {
            let pet = self
                .pets
                .update_with(&updated.pet_id, |pet| {
                    pet.status = status;
                    Ok(())
                })
                .await?;
            if pet.is_none() {
                tracing::warn!(
                    "Application {} refers to unknown pet {}",
                    id,
                    updated.pet_id
                );
            }
        }

        Ok(Some(updated))
    }

    pub async fn delete_application(&self, id: &str) -> Result<bool, AppError> {
        self.applications.delete(id).await
    }

    pub async fn stats(&self) -> Result<ApplicationStats, AppError> {
        Ok(calculate_application_stats(&self.applications.list().await?))
    }
}

/// `status` and `timeline` only change through the transition table.
fn patch_touches_status(patch: &JsonPatch) -> bool {
    patch.contains("status") || patch.contains("timeline")
}

fn seed_application(
    n: usize,
    pet_id: &str,
    pet_name: &str,
    adopter: &str,
    status: ApplicationStatus,
    submitted_at: &str,
) -> Record<AdoptionApplication> {
    let mut timeline = vec![StatusChange {
        status: ApplicationStatus::Pending,
        at: submitted_at.to_string(),
        note: None,
    }];
    if status != ApplicationStatus::Pending {
        timeline.push(StatusChange {
            status,
            at: submitted_at.to_string(),
            note: None,
        });
    }

    Record::new(
        counter_id("app", n),
        AdoptionApplication {
            pet_id: pet_id.to_string(),
            pet_name: pet_name.to_string(),
            adopter_id: format!("user-{}", adopter.to_lowercase()),
            adopter_name: adopter.to_string(),
            adopter_email: format!("{}@example.com", adopter.to_lowercase()),
            status,
            home_type: "house".to_string(),
            has_yard: true,
            other_pets: false,
            experience: "Grew up with dogs".to_string(),
            notes: None,
            timeline,
            submitted_at: submitted_at.to_string(),
            updated_at: submitted_at.to_string(),
        },
    )
}

pub fn default_applications() -> Vec<Record<AdoptionApplication>> {
    vec![
        seed_application(
            1,
            "pet-1",
            "Buddy",
            "Sarah",
            ApplicationStatus::Pending,
            "2024-05-02T10:00:00Z",
        ),
        seed_application(
            2,
            "pet-4",
            "Coco",
            "Miguel",
            ApplicationStatus::Approved,
            "2024-04-20T15:30:00Z",
        ),
        seed_application(
            3,
            "pet-5",
            "Rocky",
            "Priya",
            ApplicationStatus::Completed,
            "2024-03-11T09:15:00Z",
        ),
        seed_application(
            4,
            "pet-3",
            "Max",
            "Tom",
            ApplicationStatus::Rejected,
            "2024-04-01T12:00:00Z",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::PetService;

    fn service() -> (ApplicationService, PetService) {
        let storage = Storage::in_memory();
        let pets = PetService::new(storage.clone());
        (ApplicationService::new(storage, pets.repository().clone()), pets)
    }

    fn form(pet_id: &str) -> ApplicationForm {
        ApplicationForm {
            pet_id: pet_id.to_string(),
            adopter_id: "user-ana".to_string(),
            adopter_name: "Ana".to_string(),
            adopter_email: "ana@example.com".to_string(),
            home_type: "apartment".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_submit_requires_available_pet() {
        let (applications, _) = service();
        assert!(matches!(
            applications.submit_application(form("pet-5")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            applications.submit_application(form("pet-404")).await,
            Err(AppError::NotFound(_))
        ));

        let id = applications.submit_application(form("pet-3")).await.unwrap();
        let stored = applications.get_application(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, ApplicationStatus::Pending);
        assert_eq!(stored.pet_name, "Max");
        assert_eq!(stored.timeline.len(), 1);
    }

    #[tokio::test]
    async fn test_status_workflow_updates_pet() {
        let (applications, pets) = service();
        let id = applications.submit_application(form("pet-3")).await.unwrap();

        applications
            .update_application_status(&id, ApplicationStatus::Interview, None)
            .await
            .unwrap()
            .unwrap();
        applications
            .update_application_status(
                &id,
                ApplicationStatus::Approved,
                Some("Great fit".to_string()),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pets.get_pet("pet-3").await.unwrap().unwrap().status, PetStatus::Pending);

        let done = applications
            .update_application_status(&id, ApplicationStatus::Completed, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(done.timeline.len(), 4);
        assert_eq!(done.notes.as_deref(), Some("Great fit"));
        assert_eq!(pets.get_pet("pet-3").await.unwrap().unwrap().status, PetStatus::Adopted);
    }

    #[tokio::test]
    async fn test_invalid_transition_is_rejected() {
        let (applications, _) = service();
        let err = applications
            .update_application_status("app-3", ApplicationStatus::Pending, None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AppError::InvalidTransition {
                from: "completed".to_string(),
                to: "pending".to_string()
            }
        );
        let unchanged = applications.get_application("app-3").await.unwrap().unwrap();
        assert_eq!(unchanged.status, ApplicationStatus::Completed);
    }

    #[tokio::test]
    async fn test_rejecting_approved_application_releases_pet() {
        let (applications, pets) = service();
        applications
            .update_application_status("app-2", ApplicationStatus::Rejected, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pets.get_pet("pet-4").await.unwrap().unwrap().status, PetStatus::Available);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_approve_and_reject_never_strand_pet() {
        for _ in 0..20 {
            let (applications, pets) = service();
            let id = applications.submit_application(form("pet-3")).await.unwrap();
            applications
                .update_application_status(&id, ApplicationStatus::Interview, None)
                .await
                .unwrap();

            let approve = {
                let applications = applications.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    applications
                        .update_application_status(&id, ApplicationStatus::Approved, None)
                        .await
                })
            };
            let reject = {
                let applications = applications.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    applications
                        .update_application_status(&id, ApplicationStatus::Rejected, None)
                        .await
                })
            };
            // One order makes approval an invalid move; either result is fine
            let _ = approve.await.unwrap();
            let _ = reject.await.unwrap();

            let application = applications.get_application(&id).await.unwrap().unwrap();
            let pet = pets.get_pet("pet-3").await.unwrap().unwrap();
            assert_eq!(application.status, ApplicationStatus::Rejected);
            assert_eq!(pet.status, PetStatus::Available);
        }
    }

    #[tokio::test]
    async fn test_same_status_is_a_no_op() {
        let (applications, _) = service();
        let before = applications.get_application("app-1").await.unwrap().unwrap();
        let after = applications
            .update_application_status("app-1", ApplicationStatus::Pending, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_unknown_application_is_none() {
        let (applications, _) = service();
        let result = applications
            .update_application_status("app-99", ApplicationStatus::Approved, None)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_generic_update_cannot_change_status() {
        let (applications, _) = service();
        let patch = JsonPatch::new().with("status", "completed");
        assert!(applications.update_application("app-1", &patch).await.is_err());

        let patch = JsonPatch::new().with("homeType", "condo");
        let updated = applications.update_application("app-1", &patch).await.unwrap().unwrap();
        assert_eq!(updated.home_type, "condo");
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_stats_add_up() {
        let (applications, _) = service();
        let listed = applications.list_applications().await.unwrap();
        assert_eq!(listed[0].id, "app-1");
        let stats = applications.stats().await.unwrap();
        assert_eq!(stats.by_status.values().sum::<usize>(), stats.total);
        assert_eq!(stats.approval_rate, 50.0);
    }
}
