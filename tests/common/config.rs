//! Test configuration helpers for creating trackers on temporary databases

use std::net::{SocketAddr, TcpListener};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use download_tracker::{Config, JobTracker};

/// Progress tick used by integration tests
pub const FAST_TICK: Duration = Duration::from_millis(5);

/// Configuration with a database under `dir` and a fast engine
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = dir.join("tracker.db");
    config.engine.tick_interval = FAST_TICK;
    config.engine.shutdown_timeout = Duration::from_secs(5);
    config.auth.bcrypt_cost = 4;
    config.server.api.rate_limit.enabled = false;
    config
}

/// Create a tracker on a fresh temporary database
///
/// The returned `TempDir` must be kept alive for the duration of the test.
pub async fn create_test_tracker() -> (JobTracker, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let tracker = JobTracker::new(test_config(temp_dir.path()))
        .await
        .expect("Failed to create tracker");
    (tracker, temp_dir)
}

/// Reserve a loopback address with a free port
pub fn free_local_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind ephemeral port");
    listener.local_addr().expect("Failed to read local address")
}
