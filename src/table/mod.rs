//! Document tables
//!
//! - `IndexedTable`: the public table, with field indexes and a maintained
//!   result cache
//! - `TableConfig`: per-table name, indexed fields and cache capacity
//! - `operations`: update builders (`set`, `delete`, `increment`, ...)
//!
//! The unindexed base table is internal; it owns id assignment, persistence
//! and full scans.

mod base;
mod config;
mod document;
mod errors;
mod indexed;
pub mod operations;

pub use config::{TableConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_TABLE_NAME};
pub use document::{DocId, Document};
pub use errors::{ConfigError, ConfigResult, TableError, TableResult};
pub use indexed::IndexedTable;
pub use operations::Update;
