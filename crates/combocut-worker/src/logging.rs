//! Structured job logging.
//!
//! Every line carries the job ID, job name and operation so a batch can be
//! followed through interleaved output from concurrent jobs.

use tracing::{error, info, warn, Span};

use combocut_models::JobId;

/// Logger for one job's lifecycle.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    job_name: String,
    operation: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId, job_name: &str, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            job_name: job_name.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            job_name = %self.job_name,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            job_name = %self.job_name,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            job_name = %self.job_name,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    /// Log a failed combination with its index and reason.
    pub fn log_combo_failure(&self, index: usize, stage: &str, reason: &str) {
        error!(
            job_id = %self.job_id,
            job_name = %self.job_name,
            combo = index,
            stage = stage,
            "Combination {} failed: {}", index, reason
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            job_name = %self.job_name,
            operation = %self.operation,
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            job_name = %self.job_name,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span wrapping the whole job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            job_name = %self.job_name,
            operation = %self.operation
        )
    }

    /// Span wrapping one combination of this job.
    pub fn combo_span(&self, index: usize) -> Span {
        tracing::info_span!(
            "combo",
            job_id = %self.job_id,
            job_name = %self.job_name,
            combo = index
        )
    }
}
