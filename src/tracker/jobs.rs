//! Job creation and the owner-scoped query service.

use std::sync::atomic::Ordering;

use super::JobTracker;
use crate::db::NewJob;
use crate::error::{Error, JobError, Result};
use crate::locator;
use crate::types::{Event, JobId, JobInfo, JobList, JobStats, ResultHandle, Status, UserId};

impl JobTracker {
    /// Create a job for `owner` and start driving it in the background
    ///
    /// Returns as soon as the job is persisted in `pending`; progression
    /// happens asynchronously.
    ///
    /// # Errors
    ///
    /// - [`Error::ShuttingDown`] once shutdown has begun
    /// - [`Error::Validation`] if the locator is malformed or points elsewhere
    /// - [`JobError::Duplicate`] if the owner already has an active job for it
    pub async fn create_job(&self, owner: UserId, raw_locator: &str) -> Result<JobInfo> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let source_locator = locator::validate_locator(raw_locator, &self.config.locator)?;
        let display_name =
            locator::display_name(&source_locator, &self.config.locator.fallback_name);

        let id = self
            .db
            .insert_job(&NewJob {
                owner,
                source_locator,
                display_name,
            })
            .await?;

        let job: JobInfo = self
            .db
            .get_job(id, owner)
            .await?
            .ok_or_else(|| JobError::not_found(id))?
            .into();

        tracing::info!(
            job_id = id.0,
            user_id = owner.0,
            name = %job.display_name,
            "Job created"
        );
        self.emit_event(Event::Created {
            id,
            owner,
            name: job.display_name.clone(),
        });

        self.spawn_job(job.clone());

        Ok(job)
    }

    /// Get one of `owner`'s jobs
    ///
    /// Jobs owned by someone else are reported as not found.
    pub async fn get_job(&self, owner: UserId, id: JobId) -> Result<JobInfo> {
        self.db
            .get_job(id, owner)
            .await?
            .map(JobInfo::from)
            .ok_or_else(|| JobError::not_found(id).into())
    }

    /// List `owner`'s jobs, newest first, with counts over exactly that list
    pub async fn list_with_stats(&self, owner: UserId) -> Result<JobList> {
        let jobs: Vec<JobInfo> = self
            .db
            .list_jobs_by_owner(owner)
            .await?
            .into_iter()
            .map(JobInfo::from)
            .collect();

        let stats = JobStats::tally(jobs.iter().map(|job| &job.status));

        Ok(JobList { jobs, stats })
    }

    /// Handle to the result of one of `owner`'s completed jobs
    ///
    /// # Errors
    ///
    /// - [`JobError::NotFound`] if the job is missing or foreign
    /// - [`JobError::NotCompleted`] if it has not completed
    pub async fn fetch_result(&self, owner: UserId, id: JobId) -> Result<ResultHandle> {
        let job = self.get_job(owner, id).await?;

        let location = match (job.status, job.result_location) {
            (Status::Completed, Some(location)) => location,
            (status, _) => {
                return Err(JobError::NotCompleted {
                    id: id.0,
                    status,
                }
                .into());
            }
        };

        let file_name = std::path::Path::new(&location)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| {
                format!(
                    "{}.{}",
                    job.display_name, self.config.engine.result_extension
                )
            });

        Ok(ResultHandle {
            id,
            file_name,
            location,
        })
    }
}
