//! Signed-in user context.
//!
//! Identity comes from the client's auth provider and is taken as given.
//! Calls made without a signed-in user act as the configured demo user.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Adopter,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Id of the signed-in user, or `fallback` when there is none.
pub fn resolve_user_id(user: Option<&AuthUser>, fallback: &str) -> String {
    match user {
        Some(user) if !user.id.trim().is_empty() => user.id.clone(),
        _ => {
            tracing::debug!("No signed-in user, acting as {}", fallback);
            fallback.to_string()
        }
    }
}
