//! Database layer for download-tracker
//!
//! Handles SQLite persistence for jobs, users and login sessions.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`jobs`] - Job store: creation, owner-scoped reads, status transitions
//! - [`users`] - Registered accounts
//! - [`sessions`] - Bearer session tokens

use crate::types::{JobId, JobInfo, Status, UserId, UserInfo};
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{FromRow, sqlite::SqlitePool};

mod jobs;
mod migrations;
mod sessions;
mod users;

/// New job to be inserted into the database
#[derive(Debug, Clone)]
pub struct NewJob {
    /// Owning user
    pub owner: UserId,
    /// Validated source locator
    pub source_locator: String,
    /// Display name derived from the locator
    pub display_name: String,
}

/// Job record from database
#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    /// Unique database ID
    pub id: i64,
    /// Owning user ID
    pub user_id: i64,
    /// What is to be fetched
    pub source_locator: String,
    /// Human-readable label
    pub display_name: String,
    /// Current status (0=pending, 1=processing, 2=completed, 3=failed)
    pub status: i32,
    /// Progress percentage (0-100)
    pub progress: i64,
    /// Result location, set on completion
    pub result_location: Option<String>,
    /// Failure message, set on failure
    pub diagnostic: Option<String>,
    /// Unix timestamp when the job was created
    pub created_at: i64,
    /// Unix timestamp when the job started processing
    pub started_at: Option<i64>,
    /// Unix timestamp when the job reached a terminal status
    pub completed_at: Option<i64>,
}

impl JobRow {
    /// Typed job ID
    pub fn job_id(&self) -> JobId {
        JobId(self.id)
    }

    /// Typed owner ID
    pub fn owner(&self) -> UserId {
        UserId(self.user_id)
    }

    /// Decoded status
    pub fn status(&self) -> Status {
        Status::from_i32(self.status)
    }

    /// Progress clamped to 0-100
    pub fn progress(&self) -> u8 {
        self.progress.clamp(0, 100) as u8
    }
}

impl From<JobRow> for JobInfo {
    fn from(row: JobRow) -> Self {
        JobInfo {
            id: row.job_id(),
            owner: row.owner(),
            status: row.status(),
            progress: row.progress(),
            source_locator: row.source_locator,
            display_name: row.display_name,
            result_location: row.result_location,
            diagnostic: row.diagnostic,
            created_at: timestamp(row.created_at),
            started_at: row.started_at.map(timestamp),
            completed_at: row.completed_at.map(timestamp),
        }
    }
}

/// New user to be inserted into the database
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name
    pub name: String,
    /// Normalized email
    pub email: String,
    /// bcrypt password hash
    pub password_hash: String,
}

/// User record from database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    /// Unique database ID
    pub id: i64,
    /// Display name
    pub name: String,
    /// Normalized email
    pub email: String,
    /// bcrypt password hash
    pub password_hash: String,
    /// Unix timestamp when the account was created
    pub created_at: i64,
    /// Unix timestamp of the last account change
    pub updated_at: i64,
}

impl From<UserRow> for UserInfo {
    fn from(row: UserRow) -> Self {
        UserInfo {
            id: UserId(row.id),
            name: row.name,
            email: row.email,
        }
    }
}

/// Session record joined with its user
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    /// Owning user ID
    pub user_id: i64,
    /// User display name
    pub name: String,
    /// User email
    pub email: String,
    /// Unix timestamp after which the session is rejected
    pub expires_at: i64,
}

impl From<SessionRow> for UserInfo {
    fn from(row: SessionRow) -> Self {
        UserInfo {
            id: UserId(row.user_id),
            name: row.name,
            email: row.email,
        }
    }
}

/// Convert a stored Unix timestamp, falling back to now for out-of-range values
pub(crate) fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}

/// Database handle for download-tracker
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
