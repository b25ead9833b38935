//! indextable - Incrementally maintained secondary indexes and query-result
//! caching for JSON document tables
//!
//! An `IndexedTable` keeps one sorted index per configured field and a
//! capacity-bounded cache of predicate results. Both are updated by the
//! delta of every insert, update, remove and truncate; neither is rebuilt.
//!
//! ```ignore
//! use indextable::{field, Database, MemoryStorage, TableConfig};
//! use serde_json::json;
//!
//! let mut db = Database::new(MemoryStorage::new());
//! let users = db.table(TableConfig::new("users").with_index("age"))?;
//! users.insert(json!({"name": "Ada", "age": 36}))?;
//! let adults = users.search(&field("age").ge(18))?;
//! ```

pub mod cache;
pub mod database;
pub mod executor;
pub mod index;
pub mod observability;
pub mod planner;
pub mod storage;
pub mod table;

pub use database::Database;
pub use index::{DocId, FieldIndex, IndexKey, NumberKey};
pub use planner::{field, CompareOp, Predicate};
pub use storage::{JsonStorage, MemoryStorage, Storage};
pub use table::{operations, Document, IndexedTable, TableConfig, TableError, TableResult, Update};
