//! pixtrim - cut-and-concatenate trimming engine
//!
//! Removes user-marked ranges from a recording and joins the remaining
//! pieces with an external transcode engine, without re-encoding.
//!
//! # Usage
//!
//! ```bash
//! pixtrim plan --duration 1:40 --cut 10..20 --cut 50..60
//! pixtrim trim --input take.mp4 --cut 0:10..0:20 --cut 0:50..1:00
//! ```

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod ports;

// Re-export commonly used types
pub use app::{EditSession, PipelineState, ProgressTracker, TrimInteractor};
pub use domain::cut_set::CutSet;
pub use domain::errors::{EngineError, ErrorCategory, TrimError};
pub use domain::model::{RangeId, SourceMedia, TimeRange, TimeSpec, TrimmedMedia};
pub use domain::rules::KeepRangePlanner;
