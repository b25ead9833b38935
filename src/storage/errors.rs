//! Storage error types
//!
//! Error codes:
//! - INDEXTABLE_STORAGE_IO
//! - INDEXTABLE_STORAGE_SERIALIZATION
//! - INDEXTABLE_STORAGE_CORRUPT

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode tables: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt storage at {location}: {reason}")]
    Corrupt { location: String, reason: String },
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn corrupt(location: impl Into<String>, reason: impl Into<String>) -> Self {
        StorageError::Corrupt {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::Io { .. } => "INDEXTABLE_STORAGE_IO",
            StorageError::Serialization(_) => "INDEXTABLE_STORAGE_SERIALIZATION",
            StorageError::Corrupt { .. } => "INDEXTABLE_STORAGE_CORRUPT",
        }
    }
}
