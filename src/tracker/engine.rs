//! Job lifecycle engine - drives one job from pending to a terminal status.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio_util::sync::CancellationToken;

use super::JobTracker;
use super::arena::TaskSlot;
use crate::error::Result;
use crate::types::{Event, JobId, JobInfo, Status, StatusUpdate, UserId};

/// How a job task ended without failing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Job reached `completed`
    Completed,
    /// Shutdown stopped the task; the job keeps its current status
    Interrupted,
}

impl JobTracker {
    /// Spawn the task that drives `job`
    ///
    /// Returns `false` without spawning if a task already owns the job or
    /// shutdown has begun; such a job is resumed on the next start.
    pub(crate) fn spawn_job(&self, job: JobInfo) -> bool {
        let Some(slot) = self.arena.register(job.id) else {
            if self.arena.is_closed() {
                tracing::info!(job_id = job.id.0, "Shutdown in progress, job left for next start");
            } else {
                tracing::debug!(job_id = job.id.0, "Job already has an active task");
            }
            return false;
        };

        let tracker = self.clone();
        tokio::spawn(async move {
            tracker.run_job(job, slot).await;
        });
        true
    }

    /// Run a job to completion, recording any failure on the job itself
    async fn run_job(&self, job: JobInfo, slot: TaskSlot) {
        let id = job.id;
        let owner = job.owner;

        let result = AssertUnwindSafe(self.advance_job(job, slot.token()))
            .catch_unwind()
            .await;

        let diagnostic = match result {
            Ok(Ok(Outcome::Completed)) => return,
            Ok(Ok(Outcome::Interrupted)) => {
                tracing::info!(job_id = id.0, "Job task stopped by shutdown");
                return;
            }
            Ok(Err(e)) => e.to_string(),
            Err(panic) => format!("executor panicked: {}", panic_message(panic.as_ref())),
        };

        tracing::warn!(job_id = id.0, error = %diagnostic, "Job failed");
        self.record_failure(id, owner, diagnostic).await;
        // slot drops here, after the failure is persisted
    }

    /// Walk the job through processing, progress steps and completion
    async fn advance_job(&self, mut job: JobInfo, cancel: &CancellationToken) -> Result<Outcome> {
        if job.status == Status::Pending {
            self.db.update_status(job.id, &StatusUpdate::Start).await?;
            job.status = Status::Processing;
            job.progress = 0;
            tracing::debug!(job_id = job.id.0, "Job processing");
            self.emit_event(Event::Processing {
                id: job.id,
                owner: job.owner,
            });
        }

        let tick = self.config.engine.tick_interval;
        let step = self.config.engine.progress_step.max(1);

        while job.progress < 100 {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(Outcome::Interrupted),
                _ = tokio::time::sleep(tick) => {}
            }

            let next = job.progress.saturating_add(step).min(100);
            tokio::select! {
                _ = cancel.cancelled() => return Ok(Outcome::Interrupted),
                advanced = self.executor.advance(&job, next) => advanced?,
            }
            self.db.update_progress(job.id, next).await?;
            job.progress = next;

            self.emit_event(Event::Progress {
                id: job.id,
                owner: job.owner,
                percent: next,
            });
        }

        let result_location = self.executor.result_location(&job).await?;
        self.db
            .update_status(
                job.id,
                &StatusUpdate::Complete {
                    result_location: result_location.clone(),
                },
            )
            .await?;

        tracing::info!(job_id = job.id.0, result_location = %result_location, "Job completed");
        self.emit_event(Event::Completed {
            id: job.id,
            owner: job.owner,
            result_location,
        });

        Ok(Outcome::Completed)
    }

    /// Move a job to `failed`; errors here are logged, never propagated
    async fn record_failure(&self, id: JobId, owner: UserId, diagnostic: String) {
        let update = StatusUpdate::Fail {
            diagnostic: diagnostic.clone(),
        };

        match self.db.update_status(id, &update).await {
            Ok(()) => self.emit_event(Event::Failed {
                id,
                owner,
                diagnostic,
            }),
            Err(e) => {
                tracing::error!(job_id = id.0, error = %e, "Failed to record job failure");
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
