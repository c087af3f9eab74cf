// Ports - Interface definitions (contracts)

use async_trait::async_trait;

use crate::domain::errors::*;

/// Receives fractional progress of a single engine command
pub trait ProgressObserver: Send + Sync {
    /// `fraction` is in `[0, 1]`
    fn on_progress(&self, fraction: f64);
}

/// Observer that discards progress
pub struct IgnoreProgress;

impl ProgressObserver for IgnoreProgress {
    fn on_progress(&self, _fraction: f64) {}
}

/// Port for the media engine that physically extracts and joins segments.
///
/// Artifacts are addressed by bare names inside a namespace private to the
/// engine instance. Commands against one instance must not run concurrently.
#[async_trait]
pub trait TranscodePort: Send + Sync {
    /// Prepare the engine; may be slow and may fail
    async fn initialize(&self) -> Result<(), EngineError>;

    /// Store `bytes` as the artifact `name`
    async fn write_input(&self, name: &str, bytes: &[u8]) -> Result<(), EngineError>;

    /// Copy `duration` seconds of `input` starting at `start` into `output`
    /// without re-encoding
    async fn extract(
        &self,
        input: &str,
        start: f64,
        duration: f64,
        output: &str,
        progress: &dyn ProgressObserver,
    ) -> Result<(), EngineError>;

    /// Join `segments` in order into `output` without re-encoding.
    /// `expected_duration` is the combined length of the segments.
    async fn concat(
        &self,
        segments: &[String],
        output: &str,
        expected_duration: f64,
        progress: &dyn ProgressObserver,
    ) -> Result<(), EngineError>;

    /// Read the artifact `name`
    async fn read_output(&self, name: &str) -> Result<Vec<u8>, EngineError>;

    /// Delete the artifact `name`; deleting a missing artifact succeeds
    async fn delete(&self, name: &str) -> Result<(), EngineError>;
}

/// Port for discovering the duration of a recording on disk
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Total media duration in seconds
    async fn probe_duration(&self, file_path: &str) -> Result<f64, TrimError>;
}
