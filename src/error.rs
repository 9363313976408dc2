//! Error types for download-tracker
//!
//! This module provides the error taxonomy for the library:
//! - Domain-specific error types (jobs, accounts, database)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use crate::types::{JobId, Status};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for download-tracker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for download-tracker
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "engine.progress_step")
        key: Option<String>,
    },

    /// Malformed or disallowed request input
    #[error("validation failed for {field}: {message}")]
    Validation {
        /// The offending input field (e.g., "url")
        field: String,
        /// Why the value was rejected
        message: String,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Job-related error
    #[error("job error: {0}")]
    Job(#[from] JobError),

    /// Account or session error
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The fetch step of a job failed
    #[error("execution failed: {0}")]
    Execution(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Shutdown in progress - not accepting new jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a validation error on `field`
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Constraint violation (e.g., duplicate key)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Job-related errors
#[derive(Debug, Error)]
pub enum JobError {
    /// Job does not exist or is not owned by the caller
    #[error("job {id} not found")]
    NotFound {
        /// The job ID that was not found
        id: i64,
    },

    /// An active job for the same locator already exists for this owner
    #[error("this URL has already been added: {locator}")]
    Duplicate {
        /// The locator that is already being tracked
        locator: String,
    },

    /// The requested transition does not follow the lifecycle order
    #[error("cannot move job {id} from {from} to {to}")]
    InvalidTransition {
        /// The job ID
        id: i64,
        /// Status the job is currently in
        from: Status,
        /// Status the caller asked for
        to: Status,
    },

    /// The job has no result yet
    #[error("job {id} is {status}, result not available")]
    NotCompleted {
        /// The job ID
        id: i64,
        /// Status the job is currently in
        status: Status,
    },
}

impl JobError {
    /// Not-found error for a typed job id
    pub fn not_found(id: JobId) -> Self {
        JobError::NotFound { id: id.0 }
    }
}

/// Account and session errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email address already registered
    #[error("user already exists with this email")]
    EmailTaken,

    /// Unknown email or wrong password
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No bearer token on a protected request
    #[error("access token required")]
    MissingToken,

    /// Token unknown, revoked or expired
    #[error("invalid or expired token")]
    InvalidToken,

    /// Password hashing or verification could not run
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "job_not_found",
///     "message": "job error: job 123 not found",
///     "details": {
///       "job_id": 123
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "job_not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::Validation { .. } => 400,

            // 401 Unauthorized / 409 Conflict for account errors
            Error::Auth(AuthError::EmailTaken) => 409,
            Error::Auth(AuthError::Hashing(_)) => 500,
            Error::Auth(_) => 401,

            // 404 Not Found
            Error::NotFound(_) => 404,
            Error::Job(JobError::NotFound { .. }) => 404,
            Error::Job(JobError::NotCompleted { .. }) => 404,

            // 409 Conflict
            Error::Job(JobError::Duplicate { .. }) => 409,
            Error::Job(JobError::InvalidTransition { .. }) => 409,

            // 500 Internal Server Error - Server-side issues
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - the upstream fetch failed
            Error::Execution(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation { .. } => "validation_error",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Job(e) => match e {
                JobError::NotFound { .. } => "job_not_found",
                JobError::Duplicate { .. } => "duplicate_job",
                JobError::InvalidTransition { .. } => "invalid_transition",
                JobError::NotCompleted { .. } => "job_not_completed",
            },
            Error::Auth(e) => match e {
                AuthError::EmailTaken => "email_taken",
                AuthError::InvalidCredentials => "invalid_credentials",
                AuthError::MissingToken => "unauthorized",
                AuthError::InvalidToken => "invalid_token",
                AuthError::Hashing(_) => "internal_error",
            },
            Error::Execution(_) => "execution_failure",
            Error::Io(_) => "io_error",
            Error::NotFound(_) => "not_found",
            Error::ShuttingDown => "shutting_down",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::Validation { field, .. } => Some(serde_json::json!({
                "field": field,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::Job(JobError::NotFound { id }) => Some(serde_json::json!({
                "job_id": id,
            })),
            Error::Job(JobError::Duplicate { locator }) => Some(serde_json::json!({
                "url": locator,
            })),
            Error::Job(JobError::InvalidTransition { id, from, to }) => Some(serde_json::json!({
                "job_id": id,
                "from": from,
                "to": to,
            })),
            Error::Job(JobError::NotCompleted { id, status }) => Some(serde_json::json!({
                "job_id": id,
                "status": status,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
