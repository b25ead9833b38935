//! Indexed table
//!
//! Wraps the base table with one sorted index per configured field and keeps
//! both the indexes and the result cache current through every write.
//!
//! # Reads
//!
//! `search` answers from the result cache, then from a field index when the
//! predicate is a single comparison on an indexed field, then by scanning.
//! Index and scan answers are cached under the predicate.
//!
//! # Writes
//!
//! Storage is written first. Index and cache deltas are applied only after
//! the write succeeded, so a failed write leaves every derived structure
//! matching storage. Nothing is rebuilt: each write touches only the
//! documents it changes.
//!
//! Every indexed field is mandatory. A write that would leave a document
//! without one is rejected as a whole before anything is stored.

use std::collections::{BTreeSet, HashSet};

use serde_json::{Map, Value};

use crate::cache::CacheStats;
use crate::index::{DocId, FieldIndex, IndexSet};
use crate::observability::{Event, Logger, MetricsSnapshot, TableMetrics};
use crate::planner::{IndexAnalyzer, Predicate};
use crate::storage::SharedStorage;

use super::base::BaseTable;
use super::config::TableConfig;
use super::document::Document;
use super::errors::{TableError, TableResult};
use super::operations::Update;

/// Document table with field indexes and a maintained result cache
pub struct IndexedTable {
    config: TableConfig,
    base: BaseTable,
    indexes: IndexSet,
    metrics: TableMetrics,
}

/// One document rewritten by an update
struct Rewrite {
    id: DocId,
    old: Map<String, Value>,
    new: Map<String, Value>,
}

impl IndexedTable {
    /// Open the table named in `config`, indexing every document already
    /// stored under that name.
    pub fn open(storage: SharedStorage, config: TableConfig) -> TableResult<Self> {
        config.validate()?;

        let base = BaseTable::new(storage, config.name.clone(), config.cache_capacity);
        let mut indexes = IndexSet::new(config.indexed_fields.iter().cloned());

        let documents = base.all()?;
        for doc in &documents {
            indexes.insert(doc.id, &doc.body)?;
        }

        let count = documents.len().to_string();
        let fields = config.indexed_fields.join(",");
        Logger::info(
            Event::TableOpened,
            &[
                ("table", config.name.as_str()),
                ("documents", count.as_str()),
                ("indexed_fields", fields.as_str()),
            ],
        );

        Ok(Self {
            config,
            base,
            indexes,
            metrics: TableMetrics::new(),
        })
    }

    // ==================================================================
    // Reads
    // ==================================================================

    /// Every document matching `predicate`.
    ///
    /// Index answers come back in index key order, scan answers in id order.
    pub fn search(&mut self, predicate: &Predicate) -> TableResult<Vec<Document>> {
        if self.base.cache().contains(predicate) {
            self.metrics.increment_cache_hits();
            return self.base.search(predicate);
        }

        if let Some(found) = IndexAnalyzer::new(&self.indexes).analyze(predicate) {
            if let Some(index) = self.indexes.get(&found.field) {
                let ids = found.lookup.execute(index);
                self.metrics.increment_index_lookups();
                let docs = self.base.resolve(&ids)?;
                self.base.cache_mut().set(predicate.clone(), ids);
                return Ok(docs);
            }
        }

        self.metrics.increment_full_scans();
        self.base.search(predicate)
    }

    /// First document matching `predicate`.
    ///
    /// Cached candidates are re-checked against the predicate in order;
    /// otherwise the first match in id order.
    pub fn get(&self, predicate: &Predicate) -> TableResult<Option<Document>> {
        if let Some(ids) = self.base.cache().peek(predicate) {
            let candidates = self.base.resolve(ids)?;
            if let Some(doc) = candidates
                .into_iter()
                .find(|doc| predicate.matches(&doc.body))
            {
                return Ok(Some(doc));
            }
        }
        self.base.get(predicate)
    }

    pub fn get_by_id(&self, id: DocId) -> TableResult<Option<Document>> {
        self.base.get_by_id(id)
    }

    /// Documents for `ids` in the given order; unknown ids are skipped
    pub fn get_by_ids(&self, ids: &[DocId]) -> TableResult<Vec<Document>> {
        self.base.resolve(ids)
    }

    pub fn contains(&self, predicate: &Predicate) -> TableResult<bool> {
        Ok(self.get(predicate)?.is_some())
    }

    pub fn contains_id(&self, id: DocId) -> TableResult<bool> {
        Ok(self.get_by_id(id)?.is_some())
    }

    pub fn count(&mut self, predicate: &Predicate) -> TableResult<usize> {
        Ok(self.search(predicate)?.len())
    }

    /// Every document in id order
    pub fn all(&self) -> TableResult<Vec<Document>> {
        self.base.all()
    }

    pub fn len(&self) -> TableResult<usize> {
        self.base.len()
    }

    pub fn is_empty(&self) -> TableResult<bool> {
        Ok(self.len()? == 0)
    }

    // ==================================================================
    // Writes
    // ==================================================================

    /// Insert one document and return its id
    pub fn insert(&mut self, document: Value) -> TableResult<DocId> {
        let mut ids = self.insert_multiple([document])?;
        Ok(ids.remove(0))
    }

    /// Insert documents in order and return their ids.
    ///
    /// The whole batch is rejected if any document is not an object or lacks
    /// an indexed field.
    pub fn insert_multiple(
        &mut self,
        documents: impl IntoIterator<Item = Value>,
    ) -> TableResult<Vec<DocId>> {
        let bodies = documents
            .into_iter()
            .map(|document| -> TableResult<Map<String, Value>> {
                let body = into_body(document)?;
                self.indexes.validate(&body)?;
                Ok(body)
            })
            .collect::<TableResult<Vec<_>>>()
            .map_err(|e| self.failed("insert", e))?;

        let ids = self
            .base
            .insert_multiple(bodies.clone())
            .map_err(|e| self.failed("insert", e))?;

        for (id, body) in ids.iter().zip(&bodies) {
            self.base.cache_mut().apply_insert(*id, body);
            self.indexes.insert(*id, body)?;
        }
        self.metrics.add_inserted(ids.len());

        Ok(ids)
    }

    /// Apply `update` to the selected documents and return their ids.
    ///
    /// Selection is `ids` when given (unknown ids are ignored), else the
    /// documents matching `predicate`, else every document. New bodies are
    /// computed and checked before anything is written.
    pub fn update<'u>(
        &mut self,
        update: impl Into<Update<'u>>,
        predicate: Option<&Predicate>,
        ids: Option<&[DocId]>,
    ) -> TableResult<Vec<DocId>> {
        let update = update.into();
        update.validate().map_err(|e| self.failed("update", e))?;

        let indexes = &self.indexes;
        let rewrites = self
            .base
            .update_table(|table| {
                let selected: Vec<DocId> = match (ids, predicate) {
                    (Some(ids), _) => {
                        let mut seen = HashSet::new();
                        ids.iter()
                            .copied()
                            .filter(|id| table.contains_key(id) && seen.insert(*id))
                            .collect()
                    }
                    (None, Some(predicate)) => table
                        .iter()
                        .filter(|(_, body)| predicate.matches(body))
                        .map(|(id, _)| *id)
                        .collect(),
                    (None, None) => table.keys().copied().collect(),
                };

                let mut rewrites = Vec::with_capacity(selected.len());
                for id in selected {
                    let Some(old) = table.get(&id) else {
                        continue;
                    };
                    let mut new = old.clone();
                    update.apply(&mut new);
                    indexes.validate(&new)?;
                    rewrites.push(Rewrite {
                        id,
                        old: old.clone(),
                        new,
                    });
                }

                for rewrite in &rewrites {
                    table.insert(rewrite.id, rewrite.new.clone());
                }
                Ok(rewrites)
            })
            .map_err(|e| self.failed("update", e))?;

        for Rewrite { id, old, new } in &rewrites {
            self.indexes.remove(*id, old);
            self.base.cache_mut().apply_update(*id, old, new);
            self.indexes.insert(*id, new)?;
        }
        self.metrics.add_updated(rewrites.len());

        Ok(rewrites.iter().map(|r| r.id).collect())
    }

    /// Merge `document` into every match of `predicate`, or insert it when
    /// nothing matches.
    pub fn upsert(&mut self, document: Value, predicate: &Predicate) -> TableResult<Vec<DocId>> {
        if !document.is_object() {
            return Err(self.failed("upsert", TableError::invalid_document(&document)));
        }

        let updated = self.update(document.clone(), Some(predicate), None)?;
        if !updated.is_empty() {
            return Ok(updated);
        }
        Ok(vec![self.insert(document)?])
    }

    /// Remove the documents matching `predicate`, or the documents in `ids`.
    ///
    /// Exactly one selector must be given; use `truncate` to remove
    /// everything.
    pub fn remove(
        &mut self,
        predicate: Option<&Predicate>,
        ids: Option<&[DocId]>,
    ) -> TableResult<Vec<DocId>> {
        match (predicate, ids) {
            (None, None) => {
                Logger::warn(
                    Event::RemoveRejected,
                    &[("table", self.name()), ("reason", "no selector")],
                );
                return Err(TableError::RemoveAll);
            }
            (Some(_), Some(_)) => {
                Logger::warn(
                    Event::RemoveRejected,
                    &[("table", self.name()), ("reason", "both selectors")],
                );
                return Err(TableError::AmbiguousSelector);
            }
            _ => {}
        }

        let removed = self
            .base
            .update_table(|table| {
                let selected: Vec<DocId> = match (predicate, ids) {
                    (Some(predicate), _) => table
                        .iter()
                        .filter(|(_, body)| predicate.matches(body))
                        .map(|(id, _)| *id)
                        .collect(),
                    (None, Some(ids)) => ids.to_vec(),
                    (None, None) => Vec::new(),
                };
                Ok(selected
                    .into_iter()
                    .filter_map(|id| table.remove(&id).map(|body| (id, body)))
                    .collect::<Vec<_>>())
            })
            .map_err(|e| self.failed("remove", e))?;

        let removed_ids: BTreeSet<DocId> = removed.iter().map(|(id, _)| *id).collect();
        self.base.cache_mut().retain_except(predicate, &removed_ids);
        for (id, body) in &removed {
            self.indexes.remove(*id, body);
        }
        self.metrics.add_removed(removed.len());

        Ok(removed.into_iter().map(|(id, _)| id).collect())
    }

    pub fn remove_where(&mut self, predicate: &Predicate) -> TableResult<Vec<DocId>> {
        self.remove(Some(predicate), None)
    }

    pub fn remove_ids(&mut self, ids: &[DocId]) -> TableResult<Vec<DocId>> {
        self.remove(None, Some(ids))
    }

    /// Remove every document, clearing the result cache and every index
    pub fn truncate(&mut self) -> TableResult<()> {
        self.base
            .truncate()
            .map_err(|e| self.failed("truncate", e))?;
        self.base.cache_mut().clear();
        self.indexes.clear();
        self.metrics.increment_truncates();

        Logger::info(Event::TableTruncated, &[("table", self.name())]);
        Ok(())
    }

    pub fn clear_cache(&mut self) {
        let dropped = self.base.cache().len().to_string();
        self.base.cache_mut().clear();
        Logger::info(
            Event::CacheCleared,
            &[("table", self.name()), ("entries", dropped.as_str())],
        );
    }

    // ==================================================================
    // Diagnostics
    // ==================================================================

    pub fn name(&self) -> &str {
        self.base.name()
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Indexed field names in sorted order
    pub fn indexed_fields(&self) -> Vec<&str> {
        self.indexes.fields().collect()
    }

    pub fn index(&self, field: &str) -> Option<&FieldIndex> {
        self.indexes.get(field)
    }

    /// Cached predicates, least recently used first
    pub fn cached_predicates(&self) -> Vec<Predicate> {
        self.base.cache().predicates()
    }

    /// Ids cached for `predicate`, without touching recency
    pub fn cached_ids(&self, predicate: &Predicate) -> Option<Vec<DocId>> {
        self.base.cache().peek(predicate).map(<[DocId]>::to_vec)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.base.cache().stats().clone()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Log a failed write and hand the error back
    fn failed(&self, operation: &str, err: TableError) -> TableError {
        let code = err.code();
        let reason = err.to_string();
        let fields = [
            ("table", self.name()),
            ("operation", operation),
            ("code", code),
            ("reason", reason.as_str()),
        ];
        match &err {
            TableError::Storage(_) => Logger::error(Event::StorageFailed, &fields),
            _ => {
                self.metrics.increment_writes_rejected();
                Logger::warn(Event::WriteRejected, &fields);
            }
        }
        err
    }
}

impl std::fmt::Debug for IndexedTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexedTable")
            .field("config", &self.config)
            .field("indexes", &self.indexes)
            .finish_non_exhaustive()
    }
}

fn into_body(document: Value) -> TableResult<Map<String, Value>> {
    match document {
        Value::Object(body) => Ok(body),
        other => Err(TableError::invalid_document(&other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::field;
    use crate::storage::{shared, MemoryStorage};
    use serde_json::json;

    fn table(fields: &[&str]) -> IndexedTable {
        let config = TableConfig::new("t").with_indexes(fields.iter().copied());
        IndexedTable::open(shared(MemoryStorage::new()), config).unwrap()
    }

    fn ids(docs: &[Document]) -> Vec<DocId> {
        docs.iter().map(|d| d.id).collect()
    }

    #[test]
    fn test_search_uses_index_then_cache() {
        let mut t = table(&["int"]);
        t.insert(json!({"int": 1})).unwrap();
        t.insert(json!({"int": 2})).unwrap();

        let p = field("int").eq(1);
        assert_eq!(ids(&t.search(&p).unwrap()), vec![1]);
        assert_eq!(ids(&t.search(&p).unwrap()), vec![1]);

        let metrics = t.metrics();
        assert_eq!(metrics.index_lookups, 1);
        assert_eq!(metrics.cache_hits, 1);
        assert_eq!(metrics.full_scans, 0);
        assert_eq!(t.cached_ids(&p), Some(vec![1]));
    }

    #[test]
    fn test_unindexed_search_scans() {
        let mut t = table(&["int"]);
        t.insert(json!({"int": 1, "char": "a"})).unwrap();

        assert_eq!(t.search(&field("char").eq("a")).unwrap().len(), 1);
        assert_eq!(t.metrics().full_scans, 1);
        assert_eq!(t.cached_ids(&field("char").eq("a")), Some(vec![1]));
    }

    #[test]
    fn test_insert_updates_cached_entries() {
        let mut t = table(&["int"]);
        let p = field("int").eq(1);
        t.search(&p).unwrap();

        t.insert(json!({"int": 1})).unwrap();
        t.insert(json!({"int": 2})).unwrap();

        assert_eq!(t.cached_ids(&p), Some(vec![1]));
        assert_eq!(t.index("int").unwrap().len(), 2);
    }

    #[test]
    fn test_update_moves_between_entries() {
        let mut t = table(&["int"]);
        t.insert(json!({"int": 1})).unwrap();
        t.search(&field("int").eq(1)).unwrap();
        t.search(&field("int").eq(2)).unwrap();

        let updated = t
            .update(json!({"int": 2}), Some(&field("int").eq(1)), None)
            .unwrap();

        assert_eq!(updated, vec![1]);
        assert_eq!(t.cached_ids(&field("int").eq(1)), Some(vec![]));
        assert_eq!(t.cached_ids(&field("int").eq(2)), Some(vec![1]));
    }

    #[test]
    fn test_missing_indexed_field_rejected() {
        let mut t = table(&["int"]);
        let err = t.insert(json!({"char": "a"})).unwrap_err();

        assert_eq!(err.code(), "INDEXTABLE_INDEX_MISSING_FIELD");
        assert!(t.is_empty().unwrap());
        assert_eq!(t.metrics().writes_rejected, 1);
    }

    #[test]
    fn test_non_object_rejected() {
        let mut t = table(&[]);
        let err = t.insert(json!([1, 2])).unwrap_err();
        assert_eq!(err.code(), "INDEXTABLE_INVALID_DOCUMENT");
    }

    #[test]
    fn test_remove_selector_errors() {
        let mut t = table(&["int"]);
        t.insert(json!({"int": 1})).unwrap();

        assert!(matches!(t.remove(None, None), Err(TableError::RemoveAll)));
        assert!(matches!(
            t.remove(Some(&field("int").eq(1)), Some(&[1][..])),
            Err(TableError::AmbiguousSelector)
        ));
        assert_eq!(t.len().unwrap(), 1);
    }

    #[test]
    fn test_get_revalidates_cached_candidates() {
        let mut t = table(&["int"]);
        t.insert(json!({"int": 3})).unwrap();
        t.insert(json!({"int": 1})).unwrap();

        let p = field("int").lt(5);
        t.search(&p).unwrap();
        assert_eq!(t.get(&p).unwrap().unwrap().id, 2);
        assert!(t.get(&field("int").gt(5)).unwrap().is_none());
    }

    #[test]
    fn test_upsert() {
        let mut t = table(&["int"]);
        t.insert(json!({"int": 1, "char": "a"})).unwrap();

        assert_eq!(
            t.upsert(json!({"int": 1, "char": "b"}), &field("int").eq(1)).unwrap(),
            vec![1]
        );
        assert_eq!(
            t.upsert(json!({"int": 2}), &field("int").eq(2)).unwrap(),
            vec![2]
        );
        assert_eq!(t.get_by_id(1).unwrap().unwrap().get("char"), Some(&json!("b")));
        assert_eq!(t.len().unwrap(), 2);
    }

    #[test]
    fn test_open_rejects_stored_document_without_field() {
        let storage = shared(MemoryStorage::new());
        let mut plain = IndexedTable::open(storage.clone(), TableConfig::new("t")).unwrap();
        plain.insert(json!({"char": "a"})).unwrap();

        let err = IndexedTable::open(storage, TableConfig::new("t").with_index("int")).unwrap_err();
        assert_eq!(err.code(), "INDEXTABLE_INDEX_MISSING_FIELD");
    }
}
