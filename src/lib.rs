//! # download-tracker
//!
//! Backend for tracking image download jobs on behalf of registered users.
//!
//! A user submits the detail-page URL of an image; the tracker records a
//! job in `pending`, drives it through `processing` with timed progress
//! steps, and finishes it as `completed` (with a result location) or
//! `failed` (with a diagnostic). Jobs, users and sessions live in SQLite.
//!
//! ## Components
//!
//! - [`db`] - Job store, accounts and sessions on SQLite
//! - [`tracker`] - [`JobTracker`]: lifecycle engine, query service, accounts
//! - [`api`] - axum REST API with SSE job events
//! - [`locator`] - URL validation and display-name derivation
//!
//! ## Quick Start
//!
//! ```no_run
//! use download_tracker::{Config, JobTracker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tracker = JobTracker::new(Config::default()).await?;
//!
//!     let user = tracker.register("Alice", "alice@example.com", "secret123").await?;
//!     let job = tracker
//!         .create_job(user.id, "https://www.freepik.com/free-photo/my-cool-image_123456.htm")
//!         .await?;
//!
//!     // Subscribe to events
//!     let mut events = tracker.subscribe();
//!     while let Ok(event) = events.recv().await {
//!         println!("Event: {:?}", event);
//!     }
//!
//!     println!("{}", tracker.get_job(user.id, job.id).await?.status);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Password hashing, session tokens and registration rules
pub mod auth;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Download URL validation and naming
pub mod locator;
/// Core tracker implementation (decomposed into focused submodules)
pub mod tracker;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use error::{ApiError, AuthError, DatabaseError, Error, ErrorDetail, JobError, Result, ToHttpStatus};
pub use tracker::JobTracker;
pub use tracker::executor::{JobExecutor, SimulatedExecutor};
pub use types::{
    Event, JobId, JobInfo, JobList, JobStats, ResultHandle, Session, Status, UserId, UserInfo,
};

/// Helper function to run the tracker with graceful signal handling.
///
/// Waits for a termination signal and then calls the tracker's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use download_tracker::{Config, JobTracker, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let tracker = JobTracker::new(Config::default()).await?;
///     let server = tracker.spawn_api_server();
///
///     // Run with automatic signal handling; the server stops with the tracker
///     run_with_shutdown(tracker).await?;
///     server.await??;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(tracker: JobTracker) -> Result<()> {
    wait_for_signal().await;
    tracker.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
