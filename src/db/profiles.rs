//! Profile repository for CRUD operations on `user_profiles`.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{CreateProfileRequest, UpdateProfileRequest, UserProfile};

const PROFILE_COLUMNS: &str =
    "id, uid, name, email, phone, location, bio, created_at, updated_at, version";

/// Database repository for user profiles.
#[derive(Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all profiles.
    pub async fn list_profiles(&self) -> Result<Vec<UserProfile>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM user_profiles ORDER BY name",
            PROFILE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(profile_from_row).collect())
    }

    /// Get a profile by auth uid.
    pub async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM user_profiles WHERE uid = ?",
            PROFILE_COLUMNS
        ))
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(profile_from_row))
    }

    /// Create a new profile.
    pub async fn create_profile(
        &self,
        request: &CreateProfileRequest,
    ) -> Result<UserProfile, AppError> {
        if request.uid.trim().is_empty() {
            return Err(AppError::Validation("Profile uid is required".to_string()));
        }
        if request.name.trim().is_empty() {
            return Err(AppError::Validation("Profile name is required".to_string()));
        }

        if let Some(existing) = self.get_profile(&request.uid).await? {
            return Err(AppError::Conflict {
                message: format!("Profile for uid {} already exists", request.uid),
                current_version: existing.version,
            });
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO user_profiles (id, uid, name, email, phone, location, bio, created_at, updated_at, version) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1)"
        )
        .bind(&id)
        .bind(&request.uid)
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.location)
        .bind(&request.bio)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
            if duplicate {
                AppError::Conflict {
                    message: format!("Profile for uid {} already exists", request.uid),
                    current_version: 1,
                }
            } else {
                AppError::from(e)
            }
        })?;

        tracing::info!("Created profile for uid {}", request.uid);

        Ok(UserProfile {
            id,
            uid: request.uid.clone(),
            name: request.name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            location: request.location.clone(),
            bio: request.bio.clone(),
            created_at: now.clone(),
            updated_at: now,
            version: 1,
        })
    }

    /// Update a profile with optimistic concurrency control. `None` when no
    /// profile has that uid.
    pub async fn update_profile(
        &self,
        uid: &str,
        request: &UpdateProfileRequest,
    ) -> Result<Option<UserProfile>, AppError> {
        let Some(existing) = self.get_profile(uid).await? else {
            tracing::debug!("No profile for uid {}", uid);
            return Ok(None);
        };

        if let Some(expected) = request.expected_version {
            if existing.version != expected {
                return Err(AppError::Conflict {
                    message: format!(
                        "Version mismatch: expected {}, current {}",
                        expected, existing.version
                    ),
                    current_version: existing.version,
                });
            }
        }

        let now = Utc::now().to_rfc3339();
        let new_version = existing.version + 1;

        let name = request.name.clone().unwrap_or(existing.name);
        let email = request.email.clone().unwrap_or(existing.email);
        let phone = request.phone.clone().or(existing.phone);
        let location = request.location.clone().or(existing.location);
        let bio = request.bio.clone().or(existing.bio);

        // Conditional UPDATE so a concurrent writer between read and write is detected
        let result = sqlx::query(
            "UPDATE user_profiles SET name = ?, email = ?, phone = ?, location = ?, bio = ?, updated_at = ?, version = ? WHERE uid = ? AND version = ?"
        )
        .bind(&name)
        .bind(&email)
        .bind(&phone)
        .bind(&location)
        .bind(&bio)
        .bind(&now)
        .bind(new_version)
        .bind(uid)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let Some(current) = self.get_profile(uid).await? else {
                return Ok(None);
            };
            return Err(AppError::Conflict {
                message: "Concurrent modification detected".to_string(),
                current_version: current.version,
            });
        }

        Ok(Some(UserProfile {
            id: existing.id,
            uid: uid.to_string(),
            name,
            email,
            phone,
            location,
            bio,
            created_at: existing.created_at,
            updated_at: now,
            version: new_version,
        }))
    }

    /// Delete a profile. Returns false when no profile had that uid.
    pub async fn delete_profile(&self, uid: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM user_profiles WHERE uid = ?")
            .bind(uid)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn profile_from_row(row: &sqlx::sqlite::SqliteRow) -> UserProfile {
    UserProfile {
        id: row.get("id"),
        uid: row.get("uid"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        location: row.get("location"),
        bio: row.get("bio"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}
