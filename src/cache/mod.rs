//! Result caching
//!
//! - `lru`: capacity-bounded map with least-recently-used eviction
//! - `query_cache`: predicate to matching-id lists, maintained incrementally
//!   by the table's write paths
//!
//! The cache never holds document bodies, only ids. Reads resolve ids against
//! the table, so a cached entry can never hand out an outdated body.

mod lru;
mod query_cache;

pub use lru::{CacheStats, LruCache};
pub use query_cache::QueryCache;
