//! Pipeline behaviour against scripted transform engines.
//!
//! Run the real FFmpeg smoke test with:
//!   cargo test -p zmingz-worker --test pipeline_tests -- --ignored

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::timeout;

use zmingz_media::{
    FfmpegCommand, FfmpegEngine, MediaResult, OutputAllocator, TransformEngine, VARIANT_A,
    VARIANT_B,
};
use zmingz_models::{JobState, MediaKind, Slot};
use zmingz_worker::{MirrorJobResult, MirrorOutcome, MirrorPipeline, WorkerError};

const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
enum Behavior {
    Code(i32),
    DelayThen(u64, i32),
    Hang,
}

struct ScriptedEngine {
    default: Behavior,
    by_output: HashMap<PathBuf, Behavior>,
    calls: Mutex<Vec<FfmpegCommand>>,
}

impl ScriptedEngine {
    fn new(default: Behavior) -> Self {
        Self {
            default,
            by_output: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with(mut self, output: &str, behavior: Behavior) -> Self {
        self.by_output.insert(PathBuf::from(output), behavior);
        self
    }

    fn command_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(FfmpegCommand::command_line)
            .collect();
        lines.sort();
        lines
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TransformEngine for ScriptedEngine {
    async fn execute(&self, command: &FfmpegCommand) -> MediaResult<i32> {
        self.calls.lock().unwrap().push(command.clone());
        let behavior = self
            .by_output
            .get(command.output())
            .copied()
            .unwrap_or(self.default);

        match behavior {
            Behavior::Code(code) => Ok(code),
            Behavior::DelayThen(ms, code) => {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok(code)
            }
            Behavior::Hang => Ok(std::future::pending::<i32>().await),
        }
    }
}

/// Engine that fails the way FFmpeg does when the input cannot be opened.
struct InputCheckingEngine;

#[async_trait]
impl TransformEngine for InputCheckingEngine {
    async fn execute(&self, command: &FfmpegCommand) -> MediaResult<i32> {
        Ok(if command.input().exists() { 0 } else { 1 })
    }
}

fn collector() -> (
    Arc<impl Fn(MirrorJobResult) + Send + Sync + 'static>,
    mpsc::UnboundedReceiver<MirrorJobResult>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let observer = Arc::new(move |result: MirrorJobResult| {
        let _ = tx.send(result);
    });
    (observer, rx)
}

async fn next(rx: &mut mpsc::UnboundedReceiver<MirrorJobResult>) -> MirrorJobResult {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for a result")
        .expect("observer channel closed")
}

async fn both(rx: &mut mpsc::UnboundedReceiver<MirrorJobResult>) -> [MirrorJobResult; 2] {
    let a = next(rx).await;
    let b = next(rx).await;
    let mut results = [a, b];
    results.sort_by_key(|r| r.slot);
    results
}

fn fixed_outputs(first: &'static str, second: &'static str) -> impl FnMut(Slot) -> PathBuf {
    move |slot| match slot {
        Slot::First => PathBuf::from(first),
        Slot::Second => PathBuf::from(second),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_image_run_invokes_engine_with_both_variants() {
    let engine = Arc::new(ScriptedEngine::new(Behavior::Code(0)));
    let pipeline = MirrorPipeline::new(engine.clone());
    let (observer, mut rx) = collector();

    let handle = pipeline
        .run(
            "/tmp/in.jpg",
            MediaKind::Image,
            fixed_outputs("/tmp/out1.jpg", "/tmp/out2.jpg"),
            &observer,
        )
        .unwrap();

    let [first, second] = both(&mut rx).await;
    handle.join().await.unwrap();

    assert_eq!(first.slot, Slot::First);
    assert_eq!(first.kind, MediaKind::Image);
    assert_eq!(
        first.outcome,
        MirrorOutcome::Success(PathBuf::from("/tmp/out1.jpg"))
    );
    assert_eq!(second.slot, Slot::Second);
    assert_eq!(
        second.outcome,
        MirrorOutcome::Success(PathBuf::from("/tmp/out2.jpg"))
    );

    assert_eq!(
        engine.command_lines(),
        vec![
            format!("-i /tmp/in.jpg -vf \"{}\" -y /tmp/out1.jpg", VARIANT_A),
            format!("-i /tmp/in.jpg -vf \"{}\" -y /tmp/out2.jpg", VARIANT_B),
        ]
    );

    // Nothing more is delivered
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_slot_variant_binding_is_stable() {
    for i in 0..5 {
        let engine = Arc::new(ScriptedEngine::new(Behavior::Code(0)));
        let pipeline = MirrorPipeline::new(engine.clone());
        let (observer, mut rx) = collector();

        let out1 = PathBuf::from(format!("/tmp/run{}/a.mp4", i));
        let out2 = PathBuf::from(format!("/tmp/run{}/b.mp4", i));
        let outputs = [out1.clone(), out2.clone()];

        let handle = pipeline
            .run(
                "/tmp/in.mp4",
                MediaKind::Video,
                |slot| outputs[slot.index()].clone(),
                &observer,
            )
            .unwrap();
        both(&mut rx).await;
        handle.join().await.unwrap();

        let calls = engine.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        for call in calls.iter() {
            let args = call.build_args();
            let filter = &args[args.iter().position(|a| a == "-vf").unwrap() + 1];
            if call.output() == out1 {
                assert_eq!(filter, VARIANT_A);
            } else {
                assert_eq!(call.output(), out2);
                assert_eq!(filter, VARIANT_B);
            }
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slot_two_completes_while_slot_one_hangs() {
    let engine = Arc::new(
        ScriptedEngine::new(Behavior::Code(0)).with("/tmp/out1.mp4", Behavior::Hang),
    );
    let pipeline = MirrorPipeline::new(engine.clone());
    let (observer, mut rx) = collector();

    let handle = pipeline
        .run(
            "/tmp/in.mp4",
            MediaKind::Video,
            fixed_outputs("/tmp/out1.mp4", "/tmp/out2.mp4"),
            &observer,
        )
        .unwrap();

    let result = next(&mut rx).await;
    assert_eq!(result.slot, Slot::Second);
    assert_eq!(
        result.outcome,
        MirrorOutcome::Success(PathBuf::from("/tmp/out2.mp4"))
    );

    let mut first_state = handle.subscribe(Slot::First);
    timeout(WAIT, first_state.wait_for(|s| *s == JobState::Running))
        .await
        .expect("slot 1 never started")
        .unwrap();
    assert_eq!(handle.state(Slot::Second), JobState::Succeeded);

    // Slot 1 is still hanging, so nothing else arrives
    assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_err());
}

#[tokio::test]
async fn test_run_returns_before_jobs_finish() {
    let engine = Arc::new(ScriptedEngine::new(Behavior::Hang));
    let pipeline = MirrorPipeline::new(engine);
    let (observer, mut rx) = collector();

    let handle = pipeline
        .run(
            "/tmp/in.jpg",
            MediaKind::Image,
            fixed_outputs("/tmp/out1.jpg", "/tmp/out2.jpg"),
            &observer,
        )
        .unwrap();

    for slot in Slot::ALL {
        assert!(!handle.state(slot).is_terminal());
    }
    assert!(rx.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slot_one_failure_does_not_affect_slot_two() {
    let engine = Arc::new(
        ScriptedEngine::new(Behavior::DelayThen(20, 0)).with("/tmp/out1.jpg", Behavior::Code(1)),
    );
    let pipeline = MirrorPipeline::new(engine);
    let (observer, mut rx) = collector();

    let handle = pipeline
        .run(
            "/tmp/in.jpg",
            MediaKind::Image,
            fixed_outputs("/tmp/out1.jpg", "/tmp/out2.jpg"),
            &observer,
        )
        .unwrap();

    let [first, second] = both(&mut rx).await;
    assert_eq!(first.outcome, MirrorOutcome::Failed(1));
    assert!(matches!(
        first.clone().into_result(),
        Err(WorkerError::EngineFailed(1))
    ));
    assert_eq!(
        second.outcome,
        MirrorOutcome::Success(PathBuf::from("/tmp/out2.jpg"))
    );

    assert_eq!(handle.state(Slot::First), JobState::Failed);
    handle.join().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slot_two_cancellation_is_reported() {
    let engine = Arc::new(
        ScriptedEngine::new(Behavior::Code(0)).with("/tmp/out2.jpg", Behavior::Code(255)),
    );
    let pipeline = MirrorPipeline::new(engine);
    let (observer, mut rx) = collector();

    let handle = pipeline
        .run(
            "/tmp/in.jpg",
            MediaKind::Image,
            fixed_outputs("/tmp/out1.jpg", "/tmp/out2.jpg"),
            &observer,
        )
        .unwrap();
    handle.join().await.unwrap();

    let [first, second] = both(&mut rx).await;
    assert_eq!(
        first.outcome,
        MirrorOutcome::Success(PathBuf::from("/tmp/out1.jpg"))
    );
    assert_eq!(second.slot, Slot::Second);
    assert_eq!(second.outcome, MirrorOutcome::Cancelled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_do_not_interfere() {
    let engine = Arc::new(ScriptedEngine::new(Behavior::DelayThen(10, 0)));
    let pipeline = MirrorPipeline::new(engine.clone());

    let (observer_a, mut rx_a) = collector();
    let (observer_b, mut rx_b) = collector();

    let run_a = pipeline
        .run(
            "/tmp/in.jpg",
            MediaKind::Image,
            fixed_outputs("/tmp/a1.jpg", "/tmp/a2.jpg"),
            &observer_a,
        )
        .unwrap();
    let run_b = pipeline
        .run(
            "/tmp/in.jpg",
            MediaKind::Image,
            fixed_outputs("/tmp/b1.jpg", "/tmp/b2.jpg"),
            &observer_b,
        )
        .unwrap();
    assert_ne!(run_a.run_id(), run_b.run_id());

    let results_a = both(&mut rx_a).await;
    let results_b = both(&mut rx_b).await;
    run_a.join().await.unwrap();
    run_b.join().await.unwrap();

    let paths = |results: &[MirrorJobResult; 2]| -> Vec<PathBuf> {
        results
            .iter()
            .map(|r| r.output_path().unwrap().to_path_buf())
            .collect()
    };
    assert_eq!(
        paths(&results_a),
        vec![PathBuf::from("/tmp/a1.jpg"), PathBuf::from("/tmp/a2.jpg")]
    );
    assert_eq!(
        paths(&results_b),
        vec![PathBuf::from("/tmp/b1.jpg"), PathBuf::from("/tmp/b2.jpg")]
    );

    assert!(rx_a.try_recv().is_err());
    assert!(rx_b.try_recv().is_err());
    assert_eq!(engine.call_count(), 4);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected_before_dispatch() {
    let engine = Arc::new(ScriptedEngine::new(Behavior::Code(0)));
    let pipeline = MirrorPipeline::new(engine.clone());
    let (observer, _rx) = collector();

    let err = pipeline
        .run(
            "",
            MediaKind::Image,
            fixed_outputs("/tmp/out1.jpg", "/tmp/out2.jpg"),
            &observer,
        )
        .err()
        .unwrap();
    assert!(err.is_invalid_request(), "{err}");

    let err = pipeline
        .run(
            "/tmp/in.jpg",
            MediaKind::Image,
            fixed_outputs("/tmp/same.jpg", "/tmp/same.jpg"),
            &observer,
        )
        .err()
        .unwrap();
    assert!(err.is_invalid_request(), "{err}");

    let err = pipeline
        .run(
            "/tmp/in.jpg",
            MediaKind::Image,
            fixed_outputs("/tmp/out1.jpg", "/tmp/in.jpg"),
            &observer,
        )
        .err()
        .unwrap();
    assert!(err.is_invalid_request(), "{err}");

    tokio::task::yield_now().await;
    assert_eq!(engine.call_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dropped_observer_discards_results() {
    let engine = Arc::new(ScriptedEngine::new(Behavior::DelayThen(50, 0)));
    let pipeline = MirrorPipeline::new(engine.clone());
    let (observer, mut rx) = collector();

    let handle = pipeline
        .run(
            "/tmp/in.jpg",
            MediaKind::Image,
            fixed_outputs("/tmp/out1.jpg", "/tmp/out2.jpg"),
            &observer,
        )
        .unwrap();
    let states = [handle.subscribe(Slot::First), handle.subscribe(Slot::Second)];
    drop(observer);

    handle.join().await.unwrap();

    for state in states {
        assert_eq!(*state.borrow(), JobState::Succeeded);
    }
    // The sender lived only inside the observer, so the channel is closed
    // and empty.
    assert!(rx.recv().await.is_none());
    assert_eq!(engine.call_count(), 2);
}

#[tokio::test]
async fn test_missing_input_surfaces_as_engine_failure() {
    let pipeline = MirrorPipeline::new(Arc::new(InputCheckingEngine));
    let (observer, mut rx) = collector();

    let handle = pipeline
        .run(
            "/nonexistent/zmingz/in.jpg",
            MediaKind::Image,
            fixed_outputs("/tmp/out1.jpg", "/tmp/out2.jpg"),
            &observer,
        )
        .expect("missing input is not checked up front");
    handle.join().await.unwrap();

    let [first, second] = both(&mut rx).await;
    assert_eq!(first.outcome, MirrorOutcome::Failed(1));
    assert_eq!(second.outcome, MirrorOutcome::Failed(1));
}

#[test]
fn test_run_outside_runtime_is_an_error() {
    let pipeline = MirrorPipeline::new(Arc::new(ScriptedEngine::new(Behavior::Code(0))));
    let (observer, _rx) = collector();

    let err = pipeline
        .run(
            "/tmp/in.jpg",
            MediaKind::Image,
            fixed_outputs("/tmp/out1.jpg", "/tmp/out2.jpg"),
            &observer,
        )
        .err()
        .unwrap();
    assert!(matches!(err, WorkerError::Runtime(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "requires ffmpeg"]
async fn test_real_ffmpeg_mirrors_image() {
    let engine = FfmpegEngine::locate().expect("ffmpeg in PATH");
    let dir = tempfile::TempDir::new().unwrap();
    let input = dir.path().join("in.png");

    let status = tokio::process::Command::new(engine.binary())
        .args(["-f", "lavfi", "-i", "testsrc=size=64x48", "-frames:v", "1", "-y"])
        .arg(&input)
        .status()
        .await
        .unwrap();
    assert!(status.success());

    let outputs = OutputAllocator::new(dir.path(), &input)
        .await
        .unwrap()
        .allocate_all()
        .unwrap();

    let pipeline = MirrorPipeline::new(Arc::new(engine));
    let (observer, mut rx) = collector();
    let handle = pipeline
        .run(
            &input,
            MediaKind::Image,
            |slot| outputs[slot.index()].clone(),
            &observer,
        )
        .unwrap();
    handle.join().await.unwrap();

    for result in both(&mut rx).await {
        let path = result.output_path().expect("transform succeeded");
        assert!(std::fs::metadata(path).unwrap().len() > 0);
    }
}
