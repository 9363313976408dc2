//! Job store: creation, owner-scoped reads and status transitions.

use crate::error::{DatabaseError, JobError};
use crate::types::{JobId, JobStats, Status, StatusUpdate, UserId};
use crate::{Error, Result};

use super::{Database, JobRow, NewJob};

const JOB_COLUMNS: &str = r#"
    id, user_id, source_locator, display_name, status, progress,
    result_location, diagnostic, created_at, started_at, completed_at
"#;

impl Database {
    /// Insert a new job in `pending` with progress 0
    ///
    /// Fails with [`JobError::Duplicate`] if the owner already has a
    /// non-failed job for the same locator.
    pub async fn insert_job(&self, job: &NewJob) -> Result<JobId> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO jobs (
                user_id, source_locator, display_name, status, progress, created_at
            ) VALUES (?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(job.owner)
        .bind(&job.source_locator)
        .bind(&job.display_name)
        .bind(Status::Pending.to_i32())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Error::Job(JobError::Duplicate {
                    locator: job.source_locator.clone(),
                })
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                Error::Database(DatabaseError::ConstraintViolation(format!(
                    "Job owner {} does not exist",
                    job.owner
                )))
            }
            _ => Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert job: {}",
                e
            ))),
        })?;

        Ok(JobId(result.last_insert_rowid()))
    }

    /// Get a job by ID, only if it belongs to `owner`
    pub async fn get_job(&self, id: JobId, owner: UserId) -> Result<Option<JobRow>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get job: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// Get a job by ID regardless of owner (engine use only)
    pub async fn get_job_unscoped(&self, id: JobId) -> Result<Option<JobRow>> {
        let row = sqlx::query_as::<_, JobRow>(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to get job: {}",
                    e
                )))
            })?;

        Ok(row)
    }

    /// List all jobs of `owner`, most recently created first
    pub async fn list_jobs_by_owner(&self, owner: UserId) -> Result<Vec<JobRow>> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list jobs: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// List jobs of every owner that have not reached a terminal status
    ///
    /// Oldest first, so restored jobs resume in submission order.
    pub async fn list_unfinished_jobs(&self) -> Result<Vec<JobRow>> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE status IN (?, ?)
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(Status::Pending.to_i32())
        .bind(Status::Processing.to_i32())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list unfinished jobs: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// Count `owner`'s jobs per status with a single aggregate query
    pub async fn count_jobs_by_status(&self, owner: UserId) -> Result<JobStats> {
        let counts: Vec<(i32, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM jobs WHERE user_id = ? GROUP BY status",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to count jobs: {}",
                e
            )))
        })?;

        let mut stats = JobStats::default();
        for (status, count) in counts {
            let count = count.max(0) as usize;
            stats.total += count;
            match Status::from_i32(status) {
                Status::Pending => stats.pending += count,
                Status::Processing => stats.processing += count,
                Status::Completed => stats.completed += count,
                Status::Failed => stats.failed += count,
            }
        }

        Ok(stats)
    }

    /// Apply a lifecycle transition atomically
    ///
    /// The UPDATE only matches rows still in an allowed source status, so two
    /// concurrent writers can never both move a job out of the same state.
    /// Fails with [`JobError::InvalidTransition`] if the job is in any other
    /// status and [`JobError::NotFound`] if it does not exist.
    pub async fn update_status(&self, id: JobId, update: &StatusUpdate) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let target = update.target();
        let sources: Vec<Status> = Status::ALL
            .into_iter()
            .filter(|status| status.can_transition_to(target))
            .collect();

        let assignments = match update {
            StatusUpdate::Start => "status = ?, progress = 0, started_at = ?",
            StatusUpdate::Complete { .. } => {
                "status = ?, progress = 100, result_location = ?, completed_at = ?"
            }
            StatusUpdate::Fail { .. } => "status = ?, diagnostic = ?, completed_at = ?",
        };
        let sql = format!(
            "UPDATE jobs SET {} WHERE id = ? AND status IN ({})",
            assignments,
            vec!["?"; sources.len()].join(", ")
        );

        let mut query = sqlx::query(&sql).bind(target.to_i32());
        query = match update {
            StatusUpdate::Start => query.bind(now),
            StatusUpdate::Complete { result_location } => query.bind(result_location).bind(now),
            StatusUpdate::Fail { diagnostic } => query.bind(diagnostic).bind(now),
        };
        query = query.bind(id);
        for status in &sources {
            query = query.bind(status.to_i32());
        }

        let result = query.execute(&self.pool).await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to update job status: {}",
                e
            )))
        })?;

        if result.rows_affected() == 0 {
            return Err(self.rejected_transition(id, target).await);
        }

        Ok(())
    }

    /// Record forward progress on a processing job
    ///
    /// Progress never moves backwards and only changes while the job is
    /// `processing`.
    pub async fn update_progress(&self, id: JobId, progress: u8) -> Result<()> {
        if progress > 100 {
            return Err(Error::validation(
                "progress",
                format!("progress must be at most 100, got {}", progress),
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET progress = ?
            WHERE id = ? AND status = ? AND progress <= ?
            "#,
        )
        .bind(i64::from(progress))
        .bind(id)
        .bind(Status::Processing.to_i32())
        .bind(i64::from(progress))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to update progress: {}",
                e
            )))
        })?;

        if result.rows_affected() == 0 {
            return Err(self.rejected_transition(id, Status::Processing).await);
        }

        Ok(())
    }

    /// Explain why a guarded UPDATE matched no row
    async fn rejected_transition(&self, id: JobId, to: Status) -> Error {
        let current: std::result::Result<Option<i32>, sqlx::Error> =
            sqlx::query_scalar("SELECT status FROM jobs WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await;

        match current {
            Ok(Some(status)) => Error::Job(JobError::InvalidTransition {
                id: id.0,
                from: Status::from_i32(status),
                to,
            }),
            Ok(None) => Error::Job(JobError::not_found(id)),
            Err(e) => Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to read job status: {}",
                e
            ))),
        }
    }
}
