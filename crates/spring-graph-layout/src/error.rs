//! Error types for layout runs.

use thiserror::Error;

use crate::adapter::AdapterError;
use crate::snapshot::SinkError;

/// Result type alias for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Errors that can occur while building or running a layout.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Two nodes produced the same key.
    #[error("duplicate node key: {key}")]
    DuplicateKey { key: String },

    /// A key-extraction function failed.
    #[error("key extraction failed: {0}")]
    Adapter(#[from] AdapterError),

    /// The snapshot sink rejected a snapshot.
    #[error("snapshot sink failed: {0}")]
    Sink(#[from] SinkError),

    /// Configuration values are out of range.
    #[error("invalid configuration: {field}: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },
}

impl LayoutError {
    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
