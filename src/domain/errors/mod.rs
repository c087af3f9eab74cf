// Domain errors - Error types for the trimming core

use thiserror::Error;

/// How a [`TrimError`] should be presented to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request itself was not acceptable; nothing was attempted
    UserInput,
    /// The cuts leave nothing to keep
    PlanningDegeneracy,
    /// The transcode engine failed or is unavailable
    EngineFailure,
}

/// Errors surfaced by the trimming core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrimError {
    /// Processing was requested with an empty cut set
    #[error("Nothing to remove: no cut ranges have been marked")]
    NoCutRanges,

    /// The transcode engine has not finished initializing
    #[error("Transcode engine is not ready")]
    EngineNotReady,

    /// Another trim job is still running on this pipeline
    #[error("A trim job is already in progress")]
    AlreadyProcessing,

    /// The cut ranges cover the whole recording
    #[error("The resulting video would be empty")]
    EmptyResult,

    /// No recording is attached to the editing session
    #[error("No recording loaded")]
    NoRecording,

    /// A cut end marker arrived without a begin marker
    #[error("No cut start has been marked")]
    NoPendingMark,

    /// Media duration is negative or not finite
    #[error("Invalid media duration: {0}")]
    InvalidDuration(f64),

    /// Invalid arguments provided
    #[error("Bad arguments: {0}")]
    BadArgs(String),

    /// The transcode engine could not be initialized
    #[error("Transcode engine unavailable: {0}")]
    EngineUnavailable(String),

    /// An engine command failed while a job was running
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

impl TrimError {
    /// Classify the error for reporting
    pub fn category(&self) -> ErrorCategory {
        match self {
            TrimError::EmptyResult => ErrorCategory::PlanningDegeneracy,
            TrimError::EngineUnavailable(_) | TrimError::ProcessingFailed(_) => {
                ErrorCategory::EngineFailure
            }
            _ => ErrorCategory::UserInput,
        }
    }
}

/// Errors reported by a transcode engine implementation
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine binary or runtime could not be started
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// A command ran but exited unsuccessfully
    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// The named artifact does not exist in the working namespace
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    /// Artifact names must be bare file names
    #[error("invalid artifact name: {0}")]
    InvalidArtifactName(String),

    /// Engine used before `initialize`
    #[error("engine not initialized")]
    NotInitialized,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
