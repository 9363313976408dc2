//! Shared test helpers for creating JobTracker instances in tests.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::tracker::JobTracker;
use crate::tracker::executor::{JobExecutor, SimulatedExecutor};
use crate::types::{JobId, JobInfo, Status, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

/// Tick used by test trackers so a full job finishes in well under a second
pub(crate) const TEST_TICK: Duration = Duration::from_millis(5);

/// Configuration pointing at `dir` with a fast engine
pub(crate) fn test_config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = dir.join("test.db");
    config.engine.tick_interval = TEST_TICK;
    config.engine.shutdown_timeout = Duration::from_secs(5);
    config.auth.bcrypt_cost = 4;
    config
}

/// Helper to create a test JobTracker with a persistent database.
/// Returns the tracker and the tempdir (which must be kept alive).
pub(crate) async fn create_test_tracker() -> (JobTracker, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let tracker = JobTracker::new(test_config(temp_dir.path())).await.unwrap();
    (tracker, temp_dir)
}

/// Same as [`create_test_tracker`] with a custom executor
pub(crate) async fn create_tracker_with(
    executor: Arc<dyn JobExecutor>,
) -> (JobTracker, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let tracker = JobTracker::with_executor(test_config(temp_dir.path()), executor)
        .await
        .unwrap();
    (tracker, temp_dir)
}

/// Register a user with a unique email
pub(crate) async fn register_user(tracker: &JobTracker, email: &str) -> UserId {
    tracker
        .register("Test User", email, "password123")
        .await
        .unwrap()
        .id
}

/// Poll until the job reaches `status`, panicking after five seconds
pub(crate) async fn wait_for_status(
    tracker: &JobTracker,
    owner: UserId,
    id: JobId,
    status: Status,
) -> JobInfo {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let job = tracker.get_job(owner, id).await.unwrap();
        if job.status == status {
            return job;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {} stuck in {} (progress {}), expected {}",
            id,
            job.status,
            job.progress,
            status
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Build a detail-page locator the default configuration accepts
pub(crate) fn locator(name: &str, n: u32) -> String {
    format!("https://www.freepik.com/free-photo/{}_{}.htm", name, n)
}

/// What a [`ScriptedExecutor`] does when asked to advance to a given progress
#[derive(Clone, Copy, Debug)]
pub(crate) enum Fault {
    /// Return an execution error
    Error,
    /// Panic inside the executor
    Panic,
    /// Advance normally, then fail to name the result
    ResultError,
    /// Advance normally, then panic while naming the result
    ResultPanic,
}

/// Executor that behaves like the simulated one until `at` progress
pub(crate) struct ScriptedExecutor {
    inner: SimulatedExecutor,
    at: u8,
    fault: Fault,
}

impl ScriptedExecutor {
    pub(crate) fn new(at: u8, fault: Fault) -> Arc<Self> {
        Arc::new(Self {
            inner: SimulatedExecutor::new(&Config::default().engine),
            at,
            fault,
        })
    }
}

#[async_trait]
impl JobExecutor for ScriptedExecutor {
    async fn advance(&self, job: &JobInfo, progress: u8) -> Result<()> {
        if progress >= self.at {
            match self.fault {
                Fault::Error => {
                    return Err(Error::Execution(format!(
                        "remote host closed connection at {}%",
                        progress
                    )));
                }
                Fault::Panic => panic!("executor exploded at {}%", progress),
                Fault::ResultError | Fault::ResultPanic => {}
            }
        }
        self.inner.advance(job, progress).await
    }

    async fn result_location(&self, job: &JobInfo) -> Result<String> {
        match self.fault {
            Fault::ResultError => Err(Error::Execution(format!(
                "no result written for job {}",
                job.id
            ))),
            Fault::ResultPanic => panic!("result naming exploded for job {}", job.id),
            Fault::Error | Fault::Panic => self.inner.result_location(job).await,
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Executor whose steps block until released, for observing mid-flight state
pub(crate) struct GatedExecutor {
    inner: SimulatedExecutor,
    gate: tokio::sync::Semaphore,
}

impl GatedExecutor {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: SimulatedExecutor::new(&Config::default().engine),
            gate: tokio::sync::Semaphore::new(0),
        })
    }

    /// Allow `steps` more progress steps across all jobs
    pub(crate) fn release(&self, steps: usize) {
        self.gate.add_permits(steps);
    }
}

#[async_trait]
impl JobExecutor for GatedExecutor {
    async fn advance(&self, job: &JobInfo, progress: u8) -> Result<()> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| Error::Execution(e.to_string()))?;
        permit.forget();
        self.inner.advance(job, progress).await
    }

    async fn result_location(&self, job: &JobInfo) -> Result<String> {
        self.inner.result_location(job).await
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

/// Wait until no job task is running, panicking after five seconds
pub(crate) async fn wait_for_idle(tracker: &JobTracker) {
    tokio::time::timeout(Duration::from_secs(5), tracker.arena.wait_idle())
        .await
        .expect("job tasks should finish");
}
