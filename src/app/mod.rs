// Application layer - Use case interactors

pub mod container;
pub mod progress;
pub mod session;
pub mod trim_interactor;

// Re-export interactors
pub use progress::ProgressTracker;
pub use session::EditSession;
pub use trim_interactor::{PipelineState, TrimInteractor};
