//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The durable unit could not be replaced.
    #[error("failed to persist {path}: {source}")]
    Persist {
        /// Destination that was being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl StorageError {
    /// Creates a persist error for the given destination.
    pub fn persist(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Persist {
            path: path.into(),
            source,
        }
    }
}
