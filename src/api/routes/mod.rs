//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`auth`] - Registration, login, session verification and logout
//! - [`jobs`] - Download job creation and owner-scoped queries
//! - [`system`] - Health, events, OpenAPI

use serde::{Deserialize, Serialize};

use crate::types::UserId;

mod auth;
mod jobs;
mod system;

// Re-export all handlers so `routes::function_name` works
pub use auth::*;
pub use jobs::*;
pub use system::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Request body for POST /auth/register
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Display name (2 to 100 characters)
    #[serde(default)]
    pub name: String,
    /// Login email
    #[serde(default)]
    pub email: String,
    /// Password
    #[serde(default)]
    pub password: String,
}

/// Response body for POST /auth/register
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    /// Confirmation message
    pub message: String,
    /// ID of the new user
    pub user_id: UserId,
}

/// Request body for POST /auth/login
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Login email
    #[serde(default)]
    pub email: String,
    /// Password
    #[serde(default)]
    pub password: String,
}

/// Request body for POST /downloads
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CreateJobRequest {
    /// Detail-page URL of the image to download
    #[serde(default)]
    pub url: String,
}
