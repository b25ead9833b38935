//! Index selection for single-field comparisons
//!
//! A predicate is answerable from an index when it is a single comparison
//! (`==`, `!=`, `<`, `<=`, `>`, `>=`) on a top-level field that has an
//! index. Every other shape is answered by a full scan.
//!
//! Negated predicates are never answered from an index. The retrieval for
//! the inner comparison returns the opposite set, and inverting the operator
//! (`not (a < 5)` to `a >= 5`) misses documents whose field holds a value of
//! another type, which the negation does match.

use crate::index::{DocId, FieldIndex, IndexCatalog, IndexKey};

use super::ast::{CompareOp, Predicate};

/// Retrieval bound to one operator and literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLookup {
    op: CompareOp,
    value: IndexKey,
}

impl IndexLookup {
    pub fn new(op: CompareOp, value: IndexKey) -> Self {
        Self { op, value }
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    pub fn value(&self) -> &IndexKey {
        &self.value
    }

    /// Run the retrieval against the index of the matched field
    pub fn execute(&self, index: &FieldIndex) -> Vec<DocId> {
        index.range(self.op, &self.value)
    }
}

/// Outcome of a successful analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMatch {
    /// Field whose index answers the predicate
    pub field: String,
    /// Retrieval to run against that index
    pub lookup: IndexLookup,
}

/// Decides whether a predicate can be answered from a field index
pub struct IndexAnalyzer<'a, C: IndexCatalog + ?Sized> {
    indexed_fields: &'a C,
}

impl<'a, C: IndexCatalog + ?Sized> IndexAnalyzer<'a, C> {
    pub fn new(indexed_fields: &'a C) -> Self {
        Self { indexed_fields }
    }

    /// Returns the index and retrieval for `predicate`, or `None` when the
    /// predicate needs a full scan.
    pub fn analyze(&self, predicate: &Predicate) -> Option<IndexMatch> {
        match predicate {
            Predicate::Compare { op, path, value } => {
                let field = path.single()?;
                if !self.indexed_fields.is_indexed(field) {
                    return None;
                }
                Some(IndexMatch {
                    field: field.to_string(),
                    lookup: IndexLookup::new(*op, value.clone()),
                })
            }
            Predicate::Not(_) => None,
            Predicate::Exists { .. }
            | Predicate::Matches { .. }
            | Predicate::Search { .. }
            | Predicate::OneOf { .. }
            | Predicate::And(..)
            | Predicate::Or(..) => None,
        }
    }
}
