//! Field indexes for indextable
//!
//! Indexes are derived, in-memory state. They are populated from the table
//! when a handle opens and afterwards only ever receive deltas.
//!
//! # Invariants
//!
//! - Each configured field has exactly one index for the handle's lifetime
//! - The ids held by an index equal the ids of the documents in the table
//! - Range results follow key order, ids ascending within a key

mod btree;
mod errors;
mod manager;

pub use btree::{DocId, FieldIndex, IndexKey, NumberKey};
pub use errors::{IndexError, IndexResult};
pub use manager::{IndexCatalog, IndexSet};
