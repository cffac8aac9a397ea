//! Structured job logging utilities.
//!
//! Provides consistent, structured logging for mirror jobs with tracing
//! spans and contextual information.

use tracing::{error, info, warn, Span};
use zmingz_models::{MediaKind, RunId, Slot};

/// Job logger for structured logging with consistent formatting.
///
/// Every line carries the run ID, the slot and the media kind, so the two
/// interleaved jobs of a run can be told apart.
#[derive(Debug, Clone)]
pub struct JobLogger {
    run_id: String,
    slot: Slot,
    kind: MediaKind,
}

impl JobLogger {
    /// Create a new job logger for one slot of a run.
    pub fn new(run_id: &RunId, slot: Slot, kind: MediaKind) -> Self {
        Self {
            run_id: run_id.to_string(),
            slot,
            kind,
        }
    }

    /// Log the start of a job.
    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            slot = %self.slot,
            kind = %self.kind,
            "Job started: {}", message
        );
    }

    /// Log a warning during job execution.
    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            slot = %self.slot,
            kind = %self.kind,
            "Job warning: {}", message
        );
    }

    /// Log an error during job execution.
    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            slot = %self.slot,
            kind = %self.kind,
            "Job error: {}", message
        );
    }

    /// Log the completion of a job.
    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            slot = %self.slot,
            kind = %self.kind,
            "Job completed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "mirror_job",
            run_id = %self.run_id,
            slot = %self.slot,
            kind = %self.kind
        )
    }
}
