//! Index error types
//!
//! Error codes:
//! - INDEXTABLE_INDEX_MISSING_FIELD

use thiserror::Error;

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Index errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// The document lacks a field that is indexed
    #[error("document has no value for indexed field '{field}'")]
    MissingField { field: String },
}

impl IndexError {
    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        IndexError::MissingField {
            field: field.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::MissingField { .. } => "INDEXTABLE_INDEX_MISSING_FIELD",
        }
    }

    /// Returns the field that failed key extraction
    pub fn field(&self) -> &str {
        match self {
            IndexError::MissingField { field } => field,
        }
    }
}
