// Trim interactor - Orchestrates the cut-and-concatenate pipeline

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info, warn};

use crate::app::progress::ProgressTracker;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::KeepRangePlanner;
use crate::ports::*;

/// Lifecycle of a pipeline and its engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Engine never activated
    Idle,
    /// Engine initialization in flight
    Loading,
    /// Ready to accept a job
    Ready,
    /// A job is running
    Processing,
}

/// Restores a state when dropped, so an abandoned future never leaves the
/// pipeline stuck in `Loading` or `Processing`.
struct StateGuard<'a> {
    state: &'a Mutex<PipelineState>,
    restore: PipelineState,
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        *lock(self.state) = self.restore;
    }
}

fn lock(state: &Mutex<PipelineState>) -> MutexGuard<'_, PipelineState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Segment pipeline: plans keep ranges, extracts each one, then joins them.
///
/// Owns its transcode engine exclusively. At most one job runs at a time; a
/// second request while one is running is rejected, not queued.
pub struct TrimInteractor {
    engine: Arc<dyn TranscodePort>,
    state: Mutex<PipelineState>,
}

impl TrimInteractor {
    /// Create new trim interactor with injected engine
    pub fn new(engine: Arc<dyn TranscodePort>) -> Self {
        Self {
            engine,
            state: Mutex::new(PipelineState::Idle),
        }
    }

    pub fn state(&self) -> PipelineState {
        *lock(&self.state)
    }

    pub fn is_processing(&self) -> bool {
        self.state() == PipelineState::Processing
    }

    /// Initialize the engine. Succeeds immediately once the pipeline is ready.
    pub async fn activate(&self) -> Result<(), TrimError> {
        let mut guard = {
            let mut state = lock(&self.state);
            match *state {
                PipelineState::Ready | PipelineState::Processing => return Ok(()),
                PipelineState::Loading => return Err(TrimError::EngineNotReady),
                PipelineState::Idle => *state = PipelineState::Loading,
            }
            StateGuard {
                state: &self.state,
                restore: PipelineState::Idle,
            }
        };

        info!("Initializing transcode engine");
        match self.engine.initialize().await {
            Ok(()) => {
                guard.restore = PipelineState::Ready;
                info!("Transcode engine ready");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Transcode engine failed to initialize");
                Err(TrimError::EngineUnavailable(e.to_string()))
            }
        }
    }

    /// Remove `cuts` from `source` and return the concatenated remainder.
    ///
    /// The cut ranges are copied when the call starts; later edits to the
    /// caller's cut set do not affect the running job.
    pub async fn process(
        &self,
        source: &SourceMedia,
        cuts: &[TimeRange],
        progress: &ProgressTracker,
    ) -> Result<TrimmedMedia, TrimError> {
        let _job = self.begin_job(source, cuts)?;
        let cuts = cuts.to_vec();

        let keep = KeepRangePlanner::plan(&cuts, source.duration);
        if keep.is_empty() {
            warn!(
                cuts = cuts.len(),
                duration = source.duration,
                "Cut ranges cover the whole recording"
            );
            return Err(TrimError::EmptyResult);
        }

        let kept = KeepRangePlanner::kept_duration(&keep);
        info!(
            cuts = cuts.len(),
            segments = keep.len(),
            duration = source.duration,
            kept,
            "Starting trim job"
        );
        progress.start(&keep);

        let mut artifacts = Vec::new();
        let outcome = self
            .run_job(source, &keep, kept, &mut artifacts, progress)
            .await;
        self.release(&artifacts).await;

        match outcome {
            Ok(bytes) => {
                info!(bytes = bytes.len(), kept, "Trim job completed");
                progress.complete(Some(format!(
                    "kept {} segment(s), {}",
                    keep.len(),
                    TimeSpec::from_seconds(kept)
                )));
                Ok(TrimmedMedia {
                    bytes,
                    container: source.container.clone(),
                    keep_ranges: keep,
                    duration: kept,
                })
            }
            Err(e) => {
                error!(error = %e, "Trim job failed");
                progress.error(&e.to_string());
                // Whatever the engine reports mid-job, the job itself failed
                Err(TrimError::ProcessingFailed(e.to_string()))
            }
        }
    }

    /// Check preconditions and move to `Processing` atomically
    fn begin_job(
        &self,
        source: &SourceMedia,
        cuts: &[TimeRange],
    ) -> Result<StateGuard<'_>, TrimError> {
        let mut state = lock(&self.state);
        match *state {
            PipelineState::Processing => return Err(TrimError::AlreadyProcessing),
            PipelineState::Idle | PipelineState::Loading => return Err(TrimError::EngineNotReady),
            PipelineState::Ready => {}
        }
        if cuts.is_empty() {
            return Err(TrimError::NoCutRanges);
        }
        validate_duration(source.duration)?;

        *state = PipelineState::Processing;
        Ok(StateGuard {
            state: &self.state,
            restore: PipelineState::Ready,
        })
    }

    /// Engine command sequence. Every artifact name is recorded before the
    /// command that creates it, so partial outputs are released too.
    async fn run_job(
        &self,
        source: &SourceMedia,
        keep: &[TimeRange],
        kept: f64,
        artifacts: &mut Vec<String>,
        progress: &ProgressTracker,
    ) -> Result<Vec<u8>, EngineError> {
        let input = format!("input.{}", source.container);
        artifacts.push(input.clone());
        self.engine.write_input(&input, &source.bytes).await?;

        let mut segments = Vec::with_capacity(keep.len());
        for (index, range) in keep.iter().enumerate() {
            let segment = format!("segment{}.{}", index, source.container);
            artifacts.push(segment.clone());
            debug!(
                segment = %segment,
                start = range.start(),
                duration = range.duration(),
                "Extracting segment"
            );
            self.engine
                .extract(
                    &input,
                    range.start(),
                    range.duration(),
                    &segment,
                    &progress.step(index),
                )
                .await?;
            segments.push(segment);
        }

        let output = format!("output.{}", source.container);
        artifacts.push(output.clone());
        debug!(segments = segments.len(), output = %output, "Concatenating segments");
        self.engine
            .concat(&segments, &output, kept, &progress.step(keep.len()))
            .await?;

        self.engine.read_output(&output).await
    }

    /// Best-effort deletion; failures are logged and never replace the job outcome
    async fn release(&self, artifacts: &[String]) {
        for name in artifacts {
            if let Err(e) = self.engine.delete(name).await {
                warn!(artifact = %name, error = %e, "Failed to delete intermediate artifact");
            }
        }
    }
}
