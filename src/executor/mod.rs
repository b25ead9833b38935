//! Predicate evaluation
//!
//! Used by full scans, by cache maintenance on every write, and by `get`
//! when it revalidates cached candidates.

mod filters;

pub use filters::PredicateFilter;
