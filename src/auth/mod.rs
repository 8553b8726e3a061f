use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub mod gate;
pub mod handler;
pub mod jwt;
pub mod utils;

/// Credential row in the identity store.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Allow-list row. Presence of an active record is what makes a signed-in
/// user an admin; absence is not an error.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminRecord {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: SessionUser,
    /// True only when the degraded-mode fallback issued this session.
    pub emergency_access: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub is_admin: bool,
}
