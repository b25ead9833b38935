//! Per-table configuration
//!
//! Every table carries its own configuration value; there is no shared
//! default list of indexed fields.
//!
//! ```json
//! { "name": "users", "indexed_fields": ["age"], "cache_capacity": 10 }
//! ```
//!
//! `cache_capacity` of `null` means unbounded.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, ConfigResult};

/// Name used by `Database::default_table`
pub const DEFAULT_TABLE_NAME: &str = "_default";

/// Result cache capacity when none is configured
pub const DEFAULT_CACHE_CAPACITY: usize = 10;

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Table name (default "_default")
    #[serde(default = "default_name")]
    pub name: String,

    /// Fields with a sorted index (default none)
    #[serde(default)]
    pub indexed_fields: Vec<String>,

    /// Result cache capacity (default 10, null for unbounded)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: Option<usize>,
}

fn default_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

fn default_cache_capacity() -> Option<usize> {
    Some(DEFAULT_CACHE_CAPACITY)
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            indexed_fields: Vec::new(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl TableConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_index(mut self, field: impl Into<String>) -> Self {
        self.indexed_fields.push(field.into());
        self
    }

    pub fn with_indexes<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indexed_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn with_cache_capacity(mut self, capacity: Option<usize>) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: TableConfig = serde_json::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.is_empty() {
            return Err(ConfigError::Invalid("table name must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for field in &self.indexed_fields {
            if field.is_empty() {
                return Err(ConfigError::Invalid(
                    "indexed field names must not be empty".into(),
                ));
            }
            if !seen.insert(field.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "field '{}' is indexed more than once",
                    field
                )));
            }
        }

        Ok(())
    }
}
