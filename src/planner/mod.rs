//! Predicates and index selection
//!
//! - `ast`: the predicate value type, its builder and operators
//! - `analyzer`: decides whether a predicate is a single-field comparison
//!   on an indexed field, and if so how to retrieve it from that index
//!
//! There is no cost model: a predicate either maps onto exactly one field
//! index or is answered by scanning the table.

mod analyzer;
mod ast;

pub use analyzer::{IndexAnalyzer, IndexLookup, IndexMatch};
pub use ast::{field, CompareOp, Field, FieldPath, Predicate};
