//! Mirror job: one engine invocation, one result.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{warn, Instrument};

use zmingz_media::{EngineOutcome, MirrorJobRequest, TransformAdapter};
use zmingz_models::{JobState, MediaKind, RunId, Slot};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;

/// Terminal outcome of a mirror job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorOutcome {
    /// Output file is complete and decodable
    Success(PathBuf),
    /// Engine was interrupted; output unusable
    Cancelled,
    /// Engine returned another code; output unusable
    Failed(i32),
}

impl MirrorOutcome {
    /// The job state this outcome terminates in.
    pub fn job_state(&self) -> JobState {
        match self {
            MirrorOutcome::Success(_) => JobState::Succeeded,
            MirrorOutcome::Cancelled => JobState::Cancelled,
            MirrorOutcome::Failed(_) => JobState::Failed,
        }
    }
}

/// Result of one slot, delivered once to the completion observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorJobResult {
    pub slot: Slot,
    pub kind: MediaKind,
    pub outcome: MirrorOutcome,
}

impl MirrorJobResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, MirrorOutcome::Success(_))
    }

    /// Output path, only when the transform succeeded.
    pub fn output_path(&self) -> Option<&Path> {
        match &self.outcome {
            MirrorOutcome::Success(path) => Some(path),
            _ => None,
        }
    }

    /// Convert into the output path or the matching engine error.
    pub fn into_result(self) -> WorkerResult<PathBuf> {
        match self.outcome {
            MirrorOutcome::Success(path) => Ok(path),
            MirrorOutcome::Cancelled => Err(WorkerError::EngineCancelled),
            MirrorOutcome::Failed(code) => Err(WorkerError::EngineFailed(code)),
        }
    }
}

/// A single mirror transform bound to one slot.
///
/// `run` consumes the job, so it executes at most once and never retries.
pub struct MirrorJob {
    request: MirrorJobRequest,
    kind: MediaKind,
    adapter: TransformAdapter,
    logger: JobLogger,
    state: watch::Sender<JobState>,
}

impl MirrorJob {
    pub fn new(
        request: MirrorJobRequest,
        kind: MediaKind,
        adapter: TransformAdapter,
        run_id: &RunId,
    ) -> Self {
        let logger = JobLogger::new(run_id, request.slot(), kind);
        let (state, _) = watch::channel(JobState::Pending);

        Self {
            request,
            kind,
            adapter,
            logger,
            state,
        }
    }

    pub fn slot(&self) -> Slot {
        self.request.slot()
    }

    pub fn request(&self) -> &MirrorJobRequest {
        &self.request
    }

    pub fn state(&self) -> JobState {
        *self.state.borrow()
    }

    /// Watch this job's state changes.
    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.state.subscribe()
    }

    /// Run the transform and produce this job's result.
    pub async fn run(self) -> MirrorJobResult {
        let span = self.logger.create_span();
        self.execute().instrument(span).await
    }

    async fn execute(self) -> MirrorJobResult {
        let slot = self.slot();

        self.transition(JobState::Running);
        self.logger.log_start(&format!(
            "{} -> {}",
            self.request.input_path().display(),
            self.request.output_path().display()
        ));

        let started = Instant::now();
        let outcome = match self.adapter.run(&self.request).await {
            EngineOutcome::Success => {
                let output = self.request.output_path().to_path_buf();
                self.logger
                    .log_completion(&format!("wrote {}", output.display()));
                MirrorOutcome::Success(output)
            }
            EngineOutcome::Cancelled => {
                self.logger.log_warning("engine cancelled the transform");
                MirrorOutcome::Cancelled
            }
            EngineOutcome::Failed(code) => {
                self.logger
                    .log_error(&format!("engine failed with return code {}", code));
                MirrorOutcome::Failed(code)
            }
        };

        let state = outcome.job_state();
        metrics::counter!(
            "zmingz_jobs_total",
            "slot" => slot.to_string(),
            "outcome" => state.as_str()
        )
        .increment(1);
        metrics::histogram!("zmingz_job_duration_seconds", "slot" => slot.to_string())
            .record(started.elapsed().as_secs_f64());

        self.transition(state);

        MirrorJobResult {
            slot,
            kind: self.kind,
            outcome,
        }
    }

    fn transition(&self, next: JobState) {
        let slot = self.slot();
        self.state.send_if_modified(|current| {
            if current.can_transition_to(next) {
                *current = next;
                true
            } else {
                warn!(%slot, from = %current, to = %next, "Ignoring illegal job state transition");
                false
            }
        });
    }
}
