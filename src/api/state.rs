//! Application state for the API server

use crate::{Config, JobTracker};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (Arc clones only).
#[derive(Clone)]
pub struct AppState {
    /// The tracker serving every request
    pub tracker: Arc<JobTracker>,

    /// Configuration the server was started with
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(tracker: Arc<JobTracker>, config: Arc<Config>) -> Self {
        Self { tracker, config }
    }
}
