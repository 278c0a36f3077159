//! Error types for the background runner.

use spring_graph_layout::LayoutError;
use thiserror::Error;

/// Errors raised by [`crate::LayoutEngine`] and its run handles.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine already has an active run.
    #[error("a layout run is already in progress on this engine")]
    RunInProgress,

    /// `start` was called outside a tokio runtime.
    #[error("no tokio runtime is available to host the layout worker")]
    NoRuntime,

    /// The layout itself failed.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// The worker thread panicked or was aborted.
    #[error("layout worker stopped unexpectedly: {0}")]
    Worker(String),

    /// The run was cancelled before it finished.
    #[error("layout run was cancelled")]
    Cancelled,

    /// The run finished without delivering a snapshot.
    #[error("layout run delivered no snapshot")]
    NoSnapshot,
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
