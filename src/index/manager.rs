//! Index set for one table
//!
//! Holds one `FieldIndex` per configured field and applies every document
//! change to all of them.
//!
//! # API
//!
//! - `validate(body)` - Check every indexed field is present
//! - `insert(id, body)` - Add a document to every index
//! - `remove(id, body)` - Remove a document from every index
//! - `clear()` - Empty every index

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde_json::{Map, Value};

use super::btree::{DocId, FieldIndex};
use super::errors::{IndexError, IndexResult};

/// Answers whether a field has an index
///
/// Lets the planner decide on index use without owning the indexes.
pub trait IndexCatalog {
    fn is_indexed(&self, field: &str) -> bool;
}

impl IndexCatalog for BTreeSet<String> {
    fn is_indexed(&self, field: &str) -> bool {
        self.contains(field)
    }
}

impl IndexCatalog for HashSet<String> {
    fn is_indexed(&self, field: &str) -> bool {
        self.contains(field)
    }
}

impl IndexCatalog for [&str] {
    fn is_indexed(&self, field: &str) -> bool {
        self.contains(&field)
    }
}

/// The field indexes of one table, keyed by field name
#[derive(Debug, Clone, Default)]
pub struct IndexSet {
    indexes: BTreeMap<String, FieldIndex>,
}

impl IndexSet {
    /// Creates one empty index per field; duplicate names collapse
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let indexes = fields
            .into_iter()
            .map(Into::into)
            .map(|field: String| (field.clone(), FieldIndex::new(field)))
            .collect();
        Self { indexes }
    }

    /// Indexed field names in sorted order
    pub fn fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.indexes.keys().map(String::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&FieldIndex> {
        self.indexes.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldIndex> + '_ {
        self.indexes.values()
    }

    /// Check that `body` carries every indexed field.
    ///
    /// Returns the first missing field in field-name order.
    pub fn validate(&self, body: &Map<String, Value>) -> IndexResult<()> {
        match self.indexes.keys().find(|field| !body.contains_key(field.as_str())) {
            Some(field) => Err(IndexError::missing_field(field.as_str())),
            None => Ok(()),
        }
    }

    /// Add a document to every index.
    ///
    /// A failure on one index does not stop the others; the first error is
    /// returned after all indexes were visited.
    pub fn insert(&mut self, id: DocId, body: &Map<String, Value>) -> IndexResult<()> {
        let mut first_error = None;
        for index in self.indexes.values_mut() {
            if let Err(e) = index.add(id, body) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Remove a document from every index
    pub fn remove(&mut self, id: DocId, body: &Map<String, Value>) {
        for index in self.indexes.values_mut() {
            index.remove(id, body);
        }
    }

    pub fn clear(&mut self) {
        for index in self.indexes.values_mut() {
            index.clear();
        }
    }

    /// Number of configured indexes
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}

impl IndexCatalog for IndexSet {
    fn is_indexed(&self, field: &str) -> bool {
        self.indexes.contains_key(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexKey;
    use serde_json::json;

    fn body(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_one_index_per_field() {
        let set = IndexSet::new(["int", "char", "int"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.fields().collect::<Vec<_>>(), vec!["char", "int"]);
        assert!(set.is_indexed("int"));
        assert!(!set.is_indexed("yar"));
    }

    #[test]
    fn test_insert_and_remove_apply_to_all() {
        let mut set = IndexSet::new(["int", "char"]);
        let doc = body(json!({"int": 1, "char": "a"}));

        set.insert(7, &doc).unwrap();
        assert_eq!(set.get("int").unwrap().lookup_eq(&IndexKey::from_int(1)), vec![7]);
        assert_eq!(set.get("char").unwrap().lookup_eq(&IndexKey::from_string("a")), vec![7]);

        set.remove(7, &doc);
        assert!(set.iter().all(|index| index.is_empty()));
    }

    #[test]
    fn test_missing_field_does_not_abort_other_indexes() {
        let mut set = IndexSet::new(["char", "int"]);
        let doc = body(json!({"int": 1}));

        let err = set.insert(1, &doc).unwrap_err();
        assert_eq!(err.field(), "char");
        assert_eq!(set.get("int").unwrap().len(), 1);
        assert!(set.get("char").unwrap().is_empty());
    }

    #[test]
    fn test_validate() {
        let set = IndexSet::new(["int"]);
        assert!(set.validate(&body(json!({"int": null}))).is_ok());
        assert_eq!(
            set.validate(&body(json!({"char": "a"}))).unwrap_err(),
            IndexError::missing_field("int")
        );
    }

    #[test]
    fn test_clear_keeps_indexes() {
        let mut set = IndexSet::new(["int"]);
        set.insert(1, &body(json!({"int": 1}))).unwrap();
        set.clear();
        assert_eq!(set.len(), 1);
        assert!(set.get("int").unwrap().is_empty());
    }
}
