//! Job progress tracking and callback system for UI integration

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::domain::model::TimeRange;
use crate::ports::ProgressObserver;

/// Progress callback trait for UI integration
pub trait ProgressCallback: Send + Sync {
    /// Called when a job starts with the number of segments to extract
    fn on_start(&self, segments: usize);

    /// Called whenever the overall percentage increases
    fn on_progress(&self, percent: u8);

    /// Called when the job completes successfully
    fn on_complete(&self, message: Option<String>);

    /// Called once when the job fails
    fn on_error(&self, error: &str);
}

/// Job phases
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProgressPhase {
    Idle,
    Extracting,
    Concatenating,
    Complete,
    Failed,
}

/// Snapshot of a job's progress
#[derive(Debug, Clone, Serialize)]
pub struct ProgressInfo {
    pub phase: ProgressPhase,
    /// Overall percentage (0-100), never decreasing within a job
    pub percent: u8,
    /// Index of the engine step currently running
    pub step: usize,
    /// Number of engine steps in the job (segments + concatenation)
    pub steps: usize,
    pub elapsed: Duration,
}

/// Tracks one trim job as a sequence of weighted engine steps.
///
/// Each extraction weighs as much as its keep range lasts; the final
/// concatenation re-muxes everything kept, so it weighs the whole kept
/// duration. Percentages only ever move forward and 100 is reserved for
/// [`ProgressTracker::complete`].
#[derive(Clone)]
pub struct ProgressTracker {
    inner: Arc<Mutex<ProgressTrackerInner>>,
    callbacks: Arc<Mutex<Vec<Arc<dyn ProgressCallback>>>>,
}

struct ProgressTrackerInner {
    phase: ProgressPhase,
    weights: Vec<f64>,
    total_weight: f64,
    step: usize,
    percent: u8,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new() -> Self {
        let inner = ProgressTrackerInner {
            phase: ProgressPhase::Idle,
            weights: Vec::new(),
            total_weight: 0.0,
            step: 0,
            percent: 0,
            start_time: Instant::now(),
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
            callbacks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a progress callback
    pub fn add_callback(&self, callback: Arc<dyn ProgressCallback>) {
        if let Ok(mut callbacks) = self.callbacks.lock() {
            callbacks.push(callback);
        }
    }

    /// Reset for a job over `keep` ranges
    pub fn start(&self, keep: &[TimeRange]) {
        let mut weights: Vec<f64> = keep.iter().map(|r| r.duration().max(0.0)).collect();
        let kept: f64 = weights.iter().sum();
        weights.push(kept);

        // Degenerate durations: fall back to equal steps
        if kept <= 0.0 || !kept.is_finite() {
            weights.iter_mut().for_each(|w| *w = 1.0);
        }

        if let Ok(mut inner) = self.inner.lock() {
            inner.total_weight = weights.iter().sum();
            inner.weights = weights;
            inner.phase = ProgressPhase::Extracting;
            inner.step = 0;
            inner.percent = 0;
            inner.start_time = Instant::now();
        }

        self.notify_callbacks(|cb| cb.on_start(keep.len()));
    }

    /// Observer for the engine command running as `step`
    pub fn step(&self, step: usize) -> StepProgress<'_> {
        if let Ok(mut inner) = self.inner.lock() {
            inner.step = step;
            if step + 1 >= inner.weights.len() {
                inner.phase = ProgressPhase::Concatenating;
            }
        }
        StepProgress {
            tracker: self,
            step,
        }
    }

    /// Record that `step` reached `fraction` of its own work
    pub fn report(&self, step: usize, fraction: f64) {
        let advanced = match self.inner.lock() {
            Ok(mut inner) => {
                if inner.weights.is_empty() || inner.total_weight <= 0.0 {
                    None
                } else {
                    let step = step.min(inner.weights.len() - 1);
                    let fraction = if fraction.is_finite() {
                        fraction.clamp(0.0, 1.0)
                    } else {
                        0.0
                    };
                    let done: f64 = inner.weights[..step].iter().sum();
                    let overall = (done + inner.weights[step] * fraction) / inner.total_weight;
                    let percent = ((overall * 100.0).floor() as u8).min(99);

                    if percent > inner.percent {
                        inner.percent = percent;
                        Some(percent)
                    } else {
                        None
                    }
                }
            }
            Err(_) => None,
        };

        if let Some(percent) = advanced {
            self.notify_callbacks(|cb| cb.on_progress(percent));
        }
    }

    /// Complete the job successfully
    pub fn complete(&self, message: Option<String>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.phase = ProgressPhase::Complete;
            inner.percent = 100;
        }

        self.notify_callbacks(|cb| cb.on_progress(100));
        self.notify_callbacks(|cb| cb.on_complete(message.clone()));
    }

    /// Mark the job as failed
    pub fn error(&self, error: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.phase = ProgressPhase::Failed;
        }

        self.notify_callbacks(|cb| cb.on_error(error));
    }

    /// Get current progress information
    pub fn get_info(&self) -> Option<ProgressInfo> {
        self.inner.lock().ok().map(|inner| ProgressInfo {
            phase: inner.phase,
            percent: inner.percent,
            step: inner.step,
            steps: inner.weights.len(),
            elapsed: inner.start_time.elapsed(),
        })
    }

    fn notify_callbacks<F>(&self, f: F)
    where
        F: Fn(&dyn ProgressCallback),
    {
        if let Ok(callbacks) = self.callbacks.lock() {
            for callback in callbacks.iter() {
                f(callback.as_ref());
            }
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine-facing view of one step of a tracked job
pub struct StepProgress<'a> {
    tracker: &'a ProgressTracker,
    step: usize,
}

impl ProgressObserver for StepProgress<'_> {
    fn on_progress(&self, fraction: f64) {
        self.tracker.report(self.step, fraction);
    }
}

/// Console progress bar on stderr
pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_start(&self, segments: usize) {
        eprintln!("Trimming: keeping {} segment(s)", segments);
    }

    fn on_progress(&self, percent: u8) {
        let bar_length = 20;
        let filled = (percent as usize * bar_length / 100).min(bar_length);
        let bar = "█".repeat(filled) + &"░".repeat(bar_length - filled);
        eprint!("\r[{}] {:>3}%", bar, percent);
        let _ = std::io::stderr().flush();
    }

    fn on_complete(&self, message: Option<String>) {
        match message {
            Some(msg) => eprintln!("\nCompleted: {}", msg),
            None => eprintln!("\nCompleted"),
        }
    }

    fn on_error(&self, error: &str) {
        eprintln!("\nError: {}", error);
    }
}

/// JSON progress callback for structured output on stdout
pub struct JsonProgressCallback;

impl ProgressCallback for JsonProgressCallback {
    fn on_start(&self, segments: usize) {
        let event = serde_json::json!({
            "event": "start",
            "segments": segments,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", event);
    }

    fn on_progress(&self, percent: u8) {
        let event = serde_json::json!({
            "event": "progress",
            "percent": percent,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", event);
    }

    fn on_complete(&self, message: Option<String>) {
        let event = serde_json::json!({
            "event": "complete",
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", event);
    }

    fn on_error(&self, error: &str) {
        let event = serde_json::json!({
            "event": "error",
            "error": error,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", event);
    }
}

/// No-op progress callback for when progress output is disabled
pub struct NoOpProgressCallback;

impl ProgressCallback for NoOpProgressCallback {
    fn on_start(&self, _segments: usize) {}
    fn on_progress(&self, _percent: u8) {}
    fn on_complete(&self, _message: Option<String>) {}
    fn on_error(&self, _error: &str) {}
}
