//! Tracking-state error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading or flushing the tracking store.
#[derive(Error, Debug)]
pub enum StateError {
    /// The state file's parent directory could not be created
    #[error("failed to create state directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Serializing the in-memory state failed
    #[error("failed to serialize tracking state: {0}")]
    Serialize(#[from] serde_json::Error),

    /// I/O error reading or writing the state file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for state operations.
pub type Result<T> = std::result::Result<T, StateError>;
