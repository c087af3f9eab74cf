//! Segment pipeline tests against a scripted transcode engine

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use pixtrim::app::progress::ProgressCallback;
use pixtrim::ports::{ProgressObserver, TranscodePort};
use pixtrim::*;

/// One recorded engine command
#[derive(Debug, Clone, PartialEq)]
enum Call {
    Initialize,
    WriteInput(String),
    Extract {
        input: String,
        start: f64,
        duration: f64,
        output: String,
    },
    Concat {
        segments: Vec<String>,
        output: String,
    },
    ReadOutput(String),
    Delete(String),
}

/// Engine that records commands and fails where told to
#[derive(Default)]
struct FakeEngine {
    calls: Mutex<Vec<Call>>,
    fail_initialize: bool,
    fail_extract_at: Option<usize>,
    /// Error returned by the failing extract; a command failure when unset
    extract_error: Option<fn() -> EngineError>,
    fail_concat: bool,
    fail_read: bool,
    fail_delete: bool,
    extracts: AtomicUsize,
    /// Extract waits for this before returning
    gate: Option<Arc<Notify>>,
    /// Signalled when an extract starts
    entered: Option<Arc<Notify>>,
}

impl FakeEngine {
    fn new() -> Self {
        Self::default()
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn extracts(&self) -> Vec<(f64, f64)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Extract {
                    start, duration, ..
                } => Some((start, duration)),
                _ => None,
            })
            .collect()
    }

    fn deleted(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    fn has_concat(&self) -> bool {
        self.calls()
            .iter()
            .any(|c| matches!(c, Call::Concat { .. }))
    }
}

#[async_trait]
impl TranscodePort for FakeEngine {
    async fn initialize(&self) -> Result<(), EngineError> {
        self.record(Call::Initialize);
        if self.fail_initialize {
            return Err(EngineError::Unavailable("no runtime".to_string()));
        }
        Ok(())
    }

    async fn write_input(&self, name: &str, _bytes: &[u8]) -> Result<(), EngineError> {
        self.record(Call::WriteInput(name.to_string()));
        Ok(())
    }

    async fn extract(
        &self,
        input: &str,
        start: f64,
        duration: f64,
        output: &str,
        progress: &dyn ProgressObserver,
    ) -> Result<(), EngineError> {
        self.record(Call::Extract {
            input: input.to_string(),
            start,
            duration,
            output: output.to_string(),
        });
        if let Some(entered) = &self.entered {
            entered.notify_one();
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let index = self.extracts.fetch_add(1, Ordering::SeqCst);
        if self.fail_extract_at == Some(index) {
            return Err(match self.extract_error {
                Some(make_error) => make_error(),
                None => command_failed("extract"),
            });
        }

        progress.on_progress(0.5);
        progress.on_progress(1.0);
        Ok(())
    }

    async fn concat(
        &self,
        segments: &[String],
        output: &str,
        _expected_duration: f64,
        progress: &dyn ProgressObserver,
    ) -> Result<(), EngineError> {
        self.record(Call::Concat {
            segments: segments.to_vec(),
            output: output.to_string(),
        });
        if self.fail_concat {
            return Err(command_failed("concat"));
        }
        progress.on_progress(1.0);
        Ok(())
    }

    async fn read_output(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        self.record(Call::ReadOutput(name.to_string()));
        if self.fail_read {
            return Err(EngineError::ArtifactNotFound(name.to_string()));
        }
        Ok(b"trimmed".to_vec())
    }

    async fn delete(&self, name: &str) -> Result<(), EngineError> {
        self.record(Call::Delete(name.to_string()));
        if self.fail_delete {
            return Err(EngineError::Io(std::io::Error::other("locked")));
        }
        Ok(())
    }
}

fn command_failed(command: &str) -> EngineError {
    EngineError::CommandFailed {
        command: command.to_string(),
        status: "exit status: 1".to_string(),
        stderr: "Invalid data found when processing input".to_string(),
    }
}

/// Records every callback the tracker makes
#[derive(Default)]
struct RecordingCallback {
    percents: Mutex<Vec<u8>>,
    completes: AtomicUsize,
    errors: AtomicUsize,
}

impl ProgressCallback for RecordingCallback {
    fn on_start(&self, _segments: usize) {}

    fn on_progress(&self, percent: u8) {
        self.percents.lock().unwrap().push(percent);
    }

    fn on_complete(&self, _message: Option<String>) {
        self.completes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_error(&self, _error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

fn recording(duration: f64) -> SourceMedia {
    SourceMedia::new(b"recording".to_vec(), duration, "mp4").unwrap()
}

fn cuts(spans: &[(f64, f64)]) -> Vec<TimeRange> {
    let mut cut_set = CutSet::new();
    for &(start, end) in spans {
        cut_set.add_cut_range(start, end);
    }
    cut_set.ranges().to_vec()
}

fn tracker() -> (ProgressTracker, Arc<RecordingCallback>) {
    let tracker = ProgressTracker::new();
    let callback = Arc::new(RecordingCallback::default());
    tracker.add_callback(callback.clone());
    (tracker, callback)
}

async fn ready_pipeline(engine: Arc<FakeEngine>) -> TrimInteractor {
    let pipeline = TrimInteractor::new(engine);
    pipeline.activate().await.unwrap();
    pipeline
}

#[tokio::test]
async fn test_keep_ranges_extracted_and_joined_in_order() {
    let engine = Arc::new(FakeEngine::new());
    let pipeline = ready_pipeline(engine.clone()).await;
    let (progress, _) = tracker();

    let result = pipeline
        .process(
            &recording(100.0),
            &cuts(&[(10.0, 20.0), (15.0, 25.0), (50.0, 60.0)]),
            &progress,
        )
        .await
        .unwrap();

    assert_eq!(
        engine.extracts(),
        vec![(0.0, 10.0), (25.0, 25.0), (60.0, 40.0)]
    );
    assert!(engine.calls().contains(&Call::Extract {
        input: "input.mp4".to_string(),
        start: 25.0,
        duration: 25.0,
        output: "segment1.mp4".to_string(),
    }));
    assert!(engine.calls().contains(&Call::Concat {
        segments: vec![
            "segment0.mp4".to_string(),
            "segment1.mp4".to_string(),
            "segment2.mp4".to_string(),
        ],
        output: "output.mp4".to_string(),
    }));

    let mut deleted = engine.deleted();
    deleted.sort();
    assert_eq!(
        deleted,
        vec![
            "input.mp4",
            "output.mp4",
            "segment0.mp4",
            "segment1.mp4",
            "segment2.mp4"
        ]
    );

    assert_eq!(result.bytes, b"trimmed");
    assert_eq!(result.container, "mp4");
    assert_eq!(result.duration, 75.0);
    let keep: Vec<(f64, f64)> = result
        .keep_ranges
        .iter()
        .map(|r| (r.start(), r.end()))
        .collect();
    assert_eq!(keep, vec![(0.0, 10.0), (25.0, 50.0), (60.0, 100.0)]);
    assert_eq!(pipeline.state(), PipelineState::Ready);
}

#[tokio::test]
async fn test_cuts_at_both_ends_leave_the_middle() {
    let engine = Arc::new(FakeEngine::new());
    let pipeline = ready_pipeline(engine.clone()).await;
    let (progress, _) = tracker();

    pipeline
        .process(
            &recording(30.0),
            &cuts(&[(0.0, 10.0), (20.0, 30.0)]),
            &progress,
        )
        .await
        .unwrap();

    assert_eq!(engine.extracts(), vec![(10.0, 10.0)]);
    assert!(engine.has_concat());
}

#[tokio::test]
async fn test_cutting_everything_touches_no_engine_command() {
    let engine = Arc::new(FakeEngine::new());
    let pipeline = ready_pipeline(engine.clone()).await;
    let (progress, callback) = tracker();

    let err = pipeline
        .process(&recording(30.0), &cuts(&[(0.0, 30.0)]), &progress)
        .await
        .unwrap_err();

    assert_eq!(err, TrimError::EmptyResult);
    assert_eq!(err.category(), ErrorCategory::PlanningDegeneracy);
    assert_eq!(engine.calls(), vec![Call::Initialize]);
    assert_eq!(callback.errors.load(Ordering::SeqCst), 0);
    assert_eq!(pipeline.state(), PipelineState::Ready);
}

#[tokio::test]
async fn test_failure_mid_job_releases_what_was_created() {
    let engine = Arc::new(FakeEngine {
        fail_extract_at: Some(1),
        ..FakeEngine::default()
    });
    let pipeline = ready_pipeline(engine.clone()).await;
    let (progress, callback) = tracker();

    let err = pipeline
        .process(
            &recording(60.0),
            &cuts(&[(10.0, 20.0), (30.0, 40.0)]),
            &progress,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, TrimError::ProcessingFailed(_)));
    assert_eq!(err.category(), ErrorCategory::EngineFailure);
    assert_eq!(engine.extracts().len(), 2);
    assert!(!engine.has_concat());

    let deleted = engine.deleted();
    assert!(deleted.contains(&"input.mp4".to_string()));
    assert!(deleted.contains(&"segment0.mp4".to_string()));
    assert!(!deleted.contains(&"output.mp4".to_string()));

    assert_eq!(callback.errors.load(Ordering::SeqCst), 1);
    assert_eq!(callback.completes.load(Ordering::SeqCst), 0);
    assert_eq!(pipeline.state(), PipelineState::Ready);

    // The pipeline accepts the next job
    let (progress, _) = tracker();
    pipeline
        .process(&recording(60.0), &cuts(&[(10.0, 20.0)]), &progress)
        .await
        .unwrap();
}

/// Runs a two-segment job that is expected to fail, returning the error
async fn failing_job(engine: Arc<FakeEngine>) -> (TrimError, Arc<RecordingCallback>, TrimInteractor) {
    let pipeline = ready_pipeline(engine).await;
    let (progress, callback) = tracker();
    let err = pipeline
        .process(&recording(30.0), &cuts(&[(10.0, 20.0)]), &progress)
        .await
        .unwrap_err();
    (err, callback, pipeline)
}

#[tokio::test]
async fn test_engine_errors_mid_job_are_processing_failures() {
    let variants: [fn() -> EngineError; 3] = [
        || EngineError::NotInitialized,
        || EngineError::Unavailable("runtime crashed".to_string()),
        || EngineError::Io(std::io::Error::other("disk full")),
    ];

    for make_error in variants {
        let engine = Arc::new(FakeEngine {
            fail_extract_at: Some(0),
            extract_error: Some(make_error),
            ..FakeEngine::default()
        });
        let (err, callback, pipeline) = failing_job(engine).await;

        assert!(
            matches!(err, TrimError::ProcessingFailed(_)),
            "{} surfaced as {:?}",
            make_error(),
            err
        );
        assert_eq!(err.category(), ErrorCategory::EngineFailure);
        assert_eq!(callback.errors.load(Ordering::SeqCst), 1);
        assert_eq!(pipeline.state(), PipelineState::Ready);
    }
}

#[tokio::test]
async fn test_concat_failure_fails_the_job() {
    let engine = Arc::new(FakeEngine {
        fail_concat: true,
        ..FakeEngine::default()
    });
    let (err, callback, pipeline) = failing_job(engine.clone()).await;

    assert!(matches!(err, TrimError::ProcessingFailed(_)));
    assert_eq!(engine.extracts().len(), 2);
    assert!(!engine
        .calls()
        .iter()
        .any(|c| matches!(c, Call::ReadOutput(_))));

    let deleted = engine.deleted();
    for name in ["input.mp4", "segment0.mp4", "segment1.mp4", "output.mp4"] {
        assert!(deleted.contains(&name.to_string()), "{} not deleted", name);
    }
    assert_eq!(callback.errors.load(Ordering::SeqCst), 1);
    assert_eq!(callback.completes.load(Ordering::SeqCst), 0);
    assert_eq!(pipeline.state(), PipelineState::Ready);
}

#[tokio::test]
async fn test_read_failure_fails_the_job() {
    let engine = Arc::new(FakeEngine {
        fail_read: true,
        ..FakeEngine::default()
    });
    let (err, callback, pipeline) = failing_job(engine.clone()).await;

    assert!(matches!(err, TrimError::ProcessingFailed(msg) if msg.contains("output.mp4")));
    assert!(engine.has_concat());

    let deleted = engine.deleted();
    for name in ["input.mp4", "segment0.mp4", "segment1.mp4", "output.mp4"] {
        assert!(deleted.contains(&name.to_string()), "{} not deleted", name);
    }
    assert_eq!(callback.errors.load(Ordering::SeqCst), 1);
    assert_eq!(callback.completes.load(Ordering::SeqCst), 0);
    assert_eq!(pipeline.state(), PipelineState::Ready);
}

#[tokio::test]
async fn test_cleanup_failure_does_not_mask_success() {
    let engine = Arc::new(FakeEngine {
        fail_delete: true,
        ..FakeEngine::default()
    });
    let pipeline = ready_pipeline(engine.clone()).await;
    let (progress, _) = tracker();

    let result = pipeline
        .process(&recording(20.0), &cuts(&[(5.0, 10.0)]), &progress)
        .await
        .unwrap();

    assert_eq!(result.duration, 15.0);
    assert_eq!(engine.deleted().len(), 4);
}

#[tokio::test]
async fn test_second_job_is_rejected_while_running() {
    let gate = Arc::new(Notify::new());
    let entered = Arc::new(Notify::new());
    let engine = Arc::new(FakeEngine {
        gate: Some(gate.clone()),
        entered: Some(entered.clone()),
        ..FakeEngine::default()
    });
    let pipeline = ready_pipeline(engine.clone()).await;
    let media = recording(30.0);
    let cut_ranges = cuts(&[(10.0, 20.0)]);
    let (first_progress, _) = tracker();
    let (second_progress, _) = tracker();

    let first = pipeline.process(&media, &cut_ranges, &first_progress);
    let second = async {
        entered.notified().await;
        assert!(pipeline.is_processing());
        let rejected = pipeline
            .process(&media, &cut_ranges, &second_progress)
            .await;
        // Let both extractions of the first job through
        gate.notify_one();
        entered.notified().await;
        gate.notify_one();
        rejected
    };

    let (first, second) = tokio::join!(first, second);
    assert_eq!(second.unwrap_err(), TrimError::AlreadyProcessing);
    assert!(first.is_ok());
    assert_eq!(engine.extracts().len(), 2);
    assert_eq!(pipeline.state(), PipelineState::Ready);
}

#[tokio::test]
async fn test_preconditions_are_checked_before_any_command() {
    let engine = Arc::new(FakeEngine::new());
    let pipeline = TrimInteractor::new(engine.clone());
    let (progress, _) = tracker();
    let media = recording(30.0);

    let err = pipeline
        .process(&media, &cuts(&[(1.0, 2.0)]), &progress)
        .await
        .unwrap_err();
    assert_eq!(err, TrimError::EngineNotReady);
    assert_eq!(pipeline.state(), PipelineState::Idle);

    pipeline.activate().await.unwrap();
    let err = pipeline.process(&media, &[], &progress).await.unwrap_err();
    assert_eq!(err, TrimError::NoCutRanges);
    assert_eq!(err.category(), ErrorCategory::UserInput);

    let broken = SourceMedia {
        bytes: Vec::new(),
        duration: f64::NAN,
        container: "mp4".to_string(),
    };
    let err = pipeline
        .process(&broken, &cuts(&[(1.0, 2.0)]), &progress)
        .await
        .unwrap_err();
    assert!(matches!(err, TrimError::InvalidDuration(_)));

    assert_eq!(engine.calls(), vec![Call::Initialize]);
    assert_eq!(pipeline.state(), PipelineState::Ready);
}

#[tokio::test]
async fn test_activation_failure_can_be_retried() {
    let engine = Arc::new(FakeEngine {
        fail_initialize: true,
        ..FakeEngine::default()
    });
    let pipeline = TrimInteractor::new(engine.clone());

    let err = pipeline.activate().await.unwrap_err();
    assert!(matches!(err, TrimError::EngineUnavailable(_)));
    assert_eq!(pipeline.state(), PipelineState::Idle);

    assert!(pipeline.activate().await.is_err());
    assert_eq!(engine.calls(), vec![Call::Initialize, Call::Initialize]);
}

#[tokio::test]
async fn test_activation_is_idempotent_once_ready() {
    let engine = Arc::new(FakeEngine::new());
    let pipeline = ready_pipeline(engine.clone()).await;
    pipeline.activate().await.unwrap();
    assert_eq!(engine.calls(), vec![Call::Initialize]);
}

#[tokio::test]
async fn test_progress_is_monotonic_and_completes() {
    let engine = Arc::new(FakeEngine::new());
    let pipeline = ready_pipeline(engine).await;
    let (progress, callback) = tracker();

    pipeline
        .process(
            &recording(100.0),
            &cuts(&[(10.0, 20.0), (50.0, 60.0)]),
            &progress,
        )
        .await
        .unwrap();

    let percents = callback.percents.lock().unwrap().clone();
    assert!(!percents.is_empty());
    assert!(percents.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(percents.last(), Some(&100));
    assert_eq!(percents.iter().filter(|&&p| p == 100).count(), 1);
    assert_eq!(callback.completes.load(Ordering::SeqCst), 1);
    assert_eq!(progress.get_info().unwrap().percent, 100);
}

#[tokio::test]
async fn test_session_runs_its_recording() {
    let engine = Arc::new(FakeEngine::new());
    let pipeline = ready_pipeline(engine.clone()).await;
    let (progress, _) = tracker();

    let mut session = EditSession::new();
    session.cut_set_mut().add_cut_range(1.0, 2.0);
    assert_eq!(
        session.process(&pipeline, &progress).await.unwrap_err(),
        TrimError::NoRecording
    );

    session.load_recording(recording(10.0));
    assert_eq!(
        session.process(&pipeline, &progress).await.unwrap_err(),
        TrimError::NoCutRanges
    );

    session.mark_cut_start(4.0);
    session.mark_cut_end(6.0).unwrap();
    let result = session.process(&pipeline, &progress).await.unwrap();

    assert_eq!(result.duration, 8.0);
    assert_eq!(engine.extracts(), vec![(0.0, 4.0), (6.0, 4.0)]);
    // The job leaves the session's cuts in place
    assert_eq!(session.cut_set().len(), 1);
}
