//! Pluggable job execution
//!
//! The engine owns timing, persistence and events; an executor only performs
//! the per-step work of a job and names where its result ends up.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::locator;
use crate::types::JobInfo;
use async_trait::async_trait;
use std::path::PathBuf;

/// Work performed on behalf of a job while the engine drives it
///
/// Any error returned here fails the job with the error's message as its
/// diagnostic. Panics are caught by the engine and treated the same way.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    /// Perform the work that precedes recording `progress` for `job`
    async fn advance(&self, job: &JobInfo, progress: u8) -> Result<()>;

    /// Location of the finished result, recorded when the job completes
    async fn result_location(&self, job: &JobInfo) -> Result<String>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Executor that fetches nothing: every step succeeds immediately and the
/// result location is derived from the job's id and display name.
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    result_dir: PathBuf,
    extension: String,
}

impl SimulatedExecutor {
    /// Create an executor naming results after the engine configuration
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            result_dir: config.result_dir.clone(),
            extension: config.result_extension.clone(),
        }
    }
}

#[async_trait]
impl JobExecutor for SimulatedExecutor {
    async fn advance(&self, _job: &JobInfo, _progress: u8) -> Result<()> {
        Ok(())
    }

    async fn result_location(&self, job: &JobInfo) -> Result<String> {
        let file_name = format!(
            "{}_{}.{}",
            job.id,
            locator::file_safe(&job.display_name),
            locator::file_safe(&self.extension)
        );
        Ok(self.result_dir.join(file_name).to_string_lossy().into_owned())
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}
