// Edit session - One recording and the cuts marked on it

use tracing::{debug, info};

use crate::app::progress::ProgressTracker;
use crate::app::trim_interactor::TrimInteractor;
use crate::domain::cut_set::CutSet;
use crate::domain::errors::TrimError;
use crate::domain::model::{RangeId, SourceMedia, TrimmedMedia};

/// Editing context handed explicitly to the pipeline
#[derive(Debug, Default)]
pub struct EditSession {
    recording: Option<SourceMedia>,
    cut_set: CutSet,
    pending_start: Option<f64>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session over a pre-configured cut set (custom ids, observers)
    pub fn with_cut_set(cut_set: CutSet) -> Self {
        Self {
            recording: None,
            cut_set,
            pending_start: None,
        }
    }

    /// Begin a new recording: everything marked on the previous one is dropped
    pub fn start_recording(&mut self) {
        info!("Starting new recording session");
        self.recording = None;
        self.pending_start = None;
        self.cut_set.clear_cut_ranges();
    }

    /// Attach a finished recording. Cuts belong to a single recording, so any
    /// existing ones are cleared.
    pub fn load_recording(&mut self, media: SourceMedia) {
        info!(
            bytes = media.bytes.len(),
            duration = media.duration,
            container = %media.container,
            "Recording loaded"
        );
        self.pending_start = None;
        if !self.cut_set.is_empty() {
            self.cut_set.clear_cut_ranges();
        }
        self.recording = Some(media);
    }

    pub fn recording(&self) -> Option<&SourceMedia> {
        self.recording.as_ref()
    }

    /// First marker of a cut. A second call moves the marker.
    pub fn mark_cut_start(&mut self, at: f64) {
        debug!(at, "Cut start marked");
        self.pending_start = Some(at);
    }

    /// Second marker of a cut: turns the pending start into a cut range
    pub fn mark_cut_end(&mut self, at: f64) -> Result<RangeId, TrimError> {
        let start = self.pending_start.take().ok_or(TrimError::NoPendingMark)?;
        Ok(self.cut_set.add_cut_range(start, at))
    }

    pub fn pending_cut_start(&self) -> Option<f64> {
        self.pending_start
    }

    pub fn cut_set(&self) -> &CutSet {
        &self.cut_set
    }

    pub fn cut_set_mut(&mut self) -> &mut CutSet {
        &mut self.cut_set
    }

    /// Run the loaded recording and the current cuts through `pipeline`
    pub async fn process(
        &self,
        pipeline: &TrimInteractor,
        progress: &ProgressTracker,
    ) -> Result<TrimmedMedia, TrimError> {
        let recording = self.recording.as_ref().ok_or(TrimError::NoRecording)?;
        pipeline
            .process(recording, self.cut_set.ranges(), progress)
            .await
    }
}
