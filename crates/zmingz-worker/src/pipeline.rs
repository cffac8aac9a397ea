//! Mirror pipeline orchestrator.
//!
//! One `run` call validates the request, builds one job per slot and spawns
//! both on the Tokio runtime. It returns as soon as both are dispatched.
//! Each job hands its result to the caller's observer independently, so the
//! two deliveries may arrive in either order and on any worker thread.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use zmingz_media::{MirrorJobRequest, TransformAdapter, TransformEngine};
use zmingz_models::{JobState, MediaKind, RunId, Slot};

use crate::delivery::{CompletionObserver, CompletionSink};
use crate::error::{WorkerError, WorkerResult};
use crate::job::MirrorJob;

/// Dispatches pairs of mirror jobs. Holds no per-run state.
#[derive(Clone)]
pub struct MirrorPipeline {
    adapter: TransformAdapter,
}

impl MirrorPipeline {
    pub fn new(engine: Arc<dyn TransformEngine>) -> Self {
        Self {
            adapter: TransformAdapter::new(engine),
        }
    }

    /// Start both mirror variants of `input_path`.
    ///
    /// `make_output_path` is called once per slot and must return two paths
    /// distinct from each other and from the input. The input file itself is
    /// not checked; a missing input is reported by the engine as a failure on
    /// both slots.
    ///
    /// Only caller misuse is returned here, as `InvalidRequest`. Engine
    /// outcomes reach `on_complete`, which is held weakly: if the caller drops
    /// its `Arc` before a job finishes, that result is discarded.
    pub fn run<F, O>(
        &self,
        input_path: impl AsRef<Path>,
        kind: MediaKind,
        mut make_output_path: F,
        on_complete: &Arc<O>,
    ) -> WorkerResult<DispatchHandle>
    where
        F: FnMut(Slot) -> PathBuf,
        O: CompletionObserver + 'static,
    {
        let input_path = input_path.as_ref();
        if input_path.as_os_str().is_empty() {
            return Err(WorkerError::invalid_request("input path is empty"));
        }

        let first = make_output_path(Slot::First);
        let second = make_output_path(Slot::Second);
        if first == second {
            return Err(WorkerError::invalid_request(format!(
                "both slots were given the same output path: {}",
                first.display()
            )));
        }

        let requests = [
            MirrorJobRequest::for_slot(input_path, &first, Slot::First)?,
            MirrorJobRequest::for_slot(input_path, &second, Slot::Second)?,
        ];

        let runtime = Handle::try_current().map_err(|e| WorkerError::Runtime(e.to_string()))?;
        let run_id = RunId::new();
        let sink = CompletionSink::new(on_complete);

        info!(
            run_id = %run_id,
            kind = %kind,
            input = %input_path.display(),
            "Dispatching mirror jobs"
        );

        let jobs = requests.map(|request| {
            let job = MirrorJob::new(request, kind, self.adapter.clone(), &run_id);
            let slot = job.slot();
            let state = job.subscribe();
            let sink = sink.clone();

            let handle = runtime.spawn(async move {
                let result = job.run().await;
                sink.deliver(result);
            });

            DispatchedJob {
                slot,
                state,
                handle,
            }
        });

        Ok(DispatchHandle { run_id, jobs })
    }
}

struct DispatchedJob {
    slot: Slot,
    state: watch::Receiver<JobState>,
    handle: JoinHandle<()>,
}

/// Handle to the two jobs of one run.
///
/// Dropping it does not cancel anything; the jobs still run to completion
/// and still deliver their results.
pub struct DispatchHandle {
    run_id: RunId,
    jobs: [DispatchedJob; 2],
}

impl DispatchHandle {
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Current state of the job in `slot`.
    pub fn state(&self, slot: Slot) -> JobState {
        *self.job(slot).state.borrow()
    }

    /// Watch state changes of the job in `slot`.
    pub fn subscribe(&self, slot: Slot) -> watch::Receiver<JobState> {
        self.job(slot).state.clone()
    }

    /// Wait until both jobs have finished and delivered.
    pub async fn join(self) -> WorkerResult<()> {
        for job in self.jobs {
            job.handle.await?;
        }
        Ok(())
    }

    fn job(&self, slot: Slot) -> &DispatchedJob {
        let job = &self.jobs[slot.index()];
        debug_assert_eq!(job.slot, slot);
        job
    }
}
