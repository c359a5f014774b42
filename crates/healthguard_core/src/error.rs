//! Error types for the HealthGuard record store.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in record store operations.
///
/// Absence of a document is not an error: lookups return `Option`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error (the primary persist step failed).
    #[error("storage error: {0}")]
    Storage(#[from] healthguard_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The collection state could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A collection name that cannot be mapped to a durable unit.
    #[error("invalid collection name {name:?}: {reason}")]
    InvalidCollectionName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The data directory is owned by another process.
    #[error("data directory locked: another process has exclusive access")]
    DataDirLocked,

    /// The data directory does not exist and creation was disabled.
    #[error("data directory does not exist: {path}")]
    DataDirMissing {
        /// The missing path.
        path: String,
    },

    /// The collection has handed out every representable identifier.
    #[error("collection {collection} has no identifiers left")]
    IdsExhausted {
        /// Collection name.
        collection: String,
    },

    /// A restore was requested but the collection has no snapshots.
    #[error("no backup found for collection {collection}")]
    BackupNotFound {
        /// Collection name.
        collection: String,
    },

    /// A snapshot exists but its contents are not a valid collection.
    #[error("backup {file} is corrupted: {message}")]
    CorruptBackup {
        /// Snapshot file name.
        file: String,
        /// Parse failure description.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid collection name error.
    pub fn invalid_collection_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCollectionName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an exhausted identifier space error.
    pub fn ids_exhausted(collection: impl Into<String>) -> Self {
        Self::IdsExhausted {
            collection: collection.into(),
        }
    }

    /// Creates a backup not found error.
    pub fn backup_not_found(collection: impl Into<String>) -> Self {
        Self::BackupNotFound {
            collection: collection.into(),
        }
    }

    /// Creates a corrupt backup error.
    pub fn corrupt_backup(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptBackup {
            file: file.into(),
            message: message.into(),
        }
    }
}
