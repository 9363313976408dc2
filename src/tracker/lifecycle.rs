//! Startup restore and shutdown coordination.

use std::sync::atomic::Ordering;

use super::JobTracker;
use crate::error::Result;
use crate::types::{Event, JobInfo};

impl JobTracker {
    /// Resume every job left unfinished by a previous run
    ///
    /// Pending jobs start from the beginning; processing jobs continue from
    /// their stored progress. Returns the number of jobs resumed.
    pub(crate) async fn restore_jobs(&self) -> Result<usize> {
        let unfinished = self.db.list_unfinished_jobs().await?;
        if unfinished.is_empty() {
            return Ok(0);
        }

        let mut resumed = 0;
        for row in unfinished {
            let job = JobInfo::from(row);
            tracing::debug!(
                job_id = job.id.0,
                status = %job.status,
                progress = job.progress,
                "Resuming job"
            );
            if self.spawn_job(job) {
                resumed += 1;
            }
        }

        tracing::info!(resumed, "Resumed unfinished jobs");
        Ok(resumed)
    }

    /// Gracefully shut down the tracker
    ///
    /// 1. Stops accepting new jobs
    /// 2. Signals every running job task to stop
    /// 3. Waits for the tasks to exit, up to `engine.shutdown_timeout`
    /// 4. Emits [`Event::Shutdown`]
    ///
    /// Interrupted jobs keep their status and progress and are resumed on the
    /// next start.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new jobs");

        let signalled = self.arena.cancel_all();
        tracing::debug!(signalled, "Signaled job tasks to stop");

        let timeout = self.config.engine.shutdown_timeout;
        match tokio::time::timeout(timeout, self.arena.wait_idle()).await {
            Ok(()) => tracing::info!("All job tasks stopped"),
            Err(_) => tracing::warn!(
                remaining = self.arena.len(),
                "Timeout waiting for job tasks to stop, proceeding with shutdown"
            ),
        }

        self.emit_event(Event::Shutdown);

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Whether new jobs are currently accepted
    pub fn is_accepting(&self) -> bool {
        self.accepting_new.load(Ordering::SeqCst)
    }

    /// Number of job tasks currently running
    pub fn active_job_count(&self) -> usize {
        self.arena.len()
    }
}
