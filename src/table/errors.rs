//! Table and configuration error types
//!
//! Error codes:
//! - INDEXTABLE_REMOVE_ALL
//! - INDEXTABLE_AMBIGUOUS_SELECTOR
//! - INDEXTABLE_INVALID_DOCUMENT
//! - INDEXTABLE_INDEX_MISSING_FIELD
//! - INDEXTABLE_CONFIG_MISMATCH
//! - INDEXTABLE_CONFIG_READ / _PARSE / _INVALID
//! - storage codes pass through unchanged

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::index::IndexError;
use crate::storage::StorageError;

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Table errors
#[derive(Debug, Error)]
pub enum TableError {
    #[error("remove() needs a predicate or a list of ids; use truncate() to remove all documents")]
    RemoveAll,

    #[error("remove() takes a predicate or a list of ids, not both")]
    AmbiguousSelector,

    #[error("document must be a JSON object, got {found}")]
    InvalidDocument { found: String },

    #[error(transparent)]
    MissingField(#[from] IndexError),

    #[error("table '{name}' is already open with a different configuration")]
    ConfigMismatch { name: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl TableError {
    pub fn invalid_document(value: &serde_json::Value) -> Self {
        let found = match value {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "a boolean",
            serde_json::Value::Number(_) => "a number",
            serde_json::Value::String(_) => "a string",
            serde_json::Value::Array(_) => "an array",
            serde_json::Value::Object(_) => "an object",
        };
        TableError::InvalidDocument {
            found: found.to_string(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            TableError::RemoveAll => "INDEXTABLE_REMOVE_ALL",
            TableError::AmbiguousSelector => "INDEXTABLE_AMBIGUOUS_SELECTOR",
            TableError::InvalidDocument { .. } => "INDEXTABLE_INVALID_DOCUMENT",
            TableError::MissingField(e) => e.code(),
            TableError::ConfigMismatch { .. } => "INDEXTABLE_CONFIG_MISMATCH",
            TableError::Storage(e) => e.code(),
            TableError::Config(e) => e.code(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "INDEXTABLE_CONFIG_READ",
            ConfigError::Parse(_) => "INDEXTABLE_CONFIG_PARSE",
            ConfigError::Invalid(_) => "INDEXTABLE_CONFIG_INVALID",
        }
    }
}
