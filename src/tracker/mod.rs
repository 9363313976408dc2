//! Core tracker implementation split into focused submodules.
//!
//! The `JobTracker` struct and its methods are organized by domain:
//! - [`jobs`] - Job creation and the owner-scoped query service
//! - [`engine`] - Per-job lifecycle task (pending → processing → terminal)
//! - [`arena`] - Ownership of in-flight job tasks
//! - [`executor`] - Pluggable per-step job work
//! - [`accounts`] - Registration, login and sessions
//! - [`lifecycle`] - Startup restore and shutdown coordination

mod accounts;
mod arena;
mod engine;
pub mod executor;
mod jobs;
mod lifecycle;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::sync::broadcast::error::RecvError;

use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::types::Event;
use arena::TaskArena;
use executor::{JobExecutor, SimulatedExecutor};

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Main tracker instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct JobTracker {
    /// Job store (public for integration tests to inspect rows)
    pub db: Arc<Database>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration
    pub(crate) config: Arc<Config>,
    /// Running job tasks and their cancellation tokens
    pub(crate) arena: TaskArena,
    /// Per-step job work
    pub(crate) executor: Arc<dyn JobExecutor>,
    /// Cleared when shutdown begins
    pub(crate) accepting_new: Arc<AtomicBool>,
}

impl JobTracker {
    /// Create a tracker that simulates job execution
    ///
    /// Opens/creates the database, runs migrations and resumes jobs left
    /// unfinished by a previous run.
    pub async fn new(config: Config) -> Result<Self> {
        let executor = Arc::new(SimulatedExecutor::new(&config.engine));
        Self::with_executor(config, executor).await
    }

    /// Create a tracker with a custom executor
    pub async fn with_executor(config: Config, executor: Arc<dyn JobExecutor>) -> Result<Self> {
        let db = Database::new(&config.persistence.database_path).await?;

        let purged = db
            .purge_expired_sessions(chrono::Utc::now().timestamp())
            .await?;
        if purged > 0 {
            tracing::debug!(purged, "Removed expired sessions");
        }

        let (event_tx, _rx) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);

        tracing::info!(executor = executor.name(), "Job tracker initialized");

        let tracker = Self {
            db: Arc::new(db),
            event_tx,
            config: Arc::new(config),
            arena: TaskArena::new(),
            executor,
            accepting_new: Arc::new(AtomicBool::new(true)),
        };

        tracker.restore_jobs().await?;

        Ok(tracker)
    }

    /// Subscribe to job events
    ///
    /// Each subscriber receives all events independently. A subscriber that
    /// falls more than 1000 events behind receives `RecvError::Lagged`.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Emit an event to all subscribers
    ///
    /// Dropped silently when nobody is subscribed.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Spawn the REST API server in a background task
    ///
    /// Listens on `server.api.bind_address` (default: 127.0.0.1:3001) and
    /// stops once the tracker emits [`Event::Shutdown`].
    pub fn spawn_api_server(&self) -> tokio::task::JoinHandle<Result<()>> {
        let tracker = Arc::new(self.clone());
        let config = self.config.clone();
        let mut events = self.subscribe();

        let shutdown = async move {
            loop {
                match events.recv().await {
                    Ok(Event::Shutdown) | Err(RecvError::Closed) => break,
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                }
            }
        };

        tokio::spawn(async move { crate::api::start_api_server(tracker, config, shutdown).await })
    }
}
