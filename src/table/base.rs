//! Unindexed document table
//!
//! Owns id assignment, persistence through the shared storage, full scans
//! and the result cache those scans fill. The indexed table wraps it and
//! keeps its own derived structures in step.
//!
//! # Invariants
//!
//! - Ids are `max(existing) + 1`, starting at 1, never reused until truncate
//! - `update_table` writes only when the mutator succeeds
//! - `update_table` leaves the result cache alone

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::cache::QueryCache;
use crate::index::DocId;
use crate::planner::Predicate;
use crate::storage::{SharedStorage, StorageError, TableData};

use super::document::Document;
use super::errors::TableResult;

/// Decoded contents of one table
pub(crate) type DocumentMap = BTreeMap<DocId, Map<String, Value>>;

pub(crate) struct BaseTable {
    name: String,
    storage: SharedStorage,
    query_cache: QueryCache,
    next_id: Option<DocId>,
}

impl BaseTable {
    pub(crate) fn new(
        storage: SharedStorage,
        name: impl Into<String>,
        cache_capacity: Option<usize>,
    ) -> Self {
        Self {
            name: name.into(),
            storage,
            query_cache: QueryCache::new(cache_capacity),
            next_id: None,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn cache(&self) -> &QueryCache {
        &self.query_cache
    }

    pub(crate) fn cache_mut(&mut self) -> &mut QueryCache {
        &mut self.query_cache
    }

    /// Current documents of this table
    pub(crate) fn read_table(&self) -> TableResult<DocumentMap> {
        let tables = self.storage.borrow_mut().read()?;
        match tables.and_then(|mut t| t.remove(&self.name)) {
            Some(raw) => self.decode(raw),
            None => Ok(DocumentMap::new()),
        }
    }

    /// Read the whole table, hand it to `updater`, write it back.
    ///
    /// Nothing is written when `updater` fails.
    pub(crate) fn update_table<R>(
        &mut self,
        updater: impl FnOnce(&mut DocumentMap) -> TableResult<R>,
    ) -> TableResult<R> {
        let mut tables = self.storage.borrow_mut().read()?.unwrap_or_default();
        let mut table = match tables.remove(&self.name) {
            Some(raw) => self.decode(raw)?,
            None => DocumentMap::new(),
        };

        let result = updater(&mut table)?;

        let encoded: TableData = table
            .into_iter()
            .map(|(id, body)| (id.to_string(), Value::Object(body)))
            .collect();
        tables.insert(self.name.clone(), encoded);
        self.storage.borrow_mut().write(&tables)?;

        Ok(result)
    }

    fn decode(&self, raw: TableData) -> TableResult<DocumentMap> {
        let mut table = DocumentMap::new();
        for (key, value) in raw {
            let id: DocId = key.parse().map_err(|_| {
                StorageError::corrupt(
                    format!("table '{}'", self.name),
                    format!("document id '{}' is not an integer", key),
                )
            })?;
            let Value::Object(body) = value else {
                return Err(StorageError::corrupt(
                    format!("table '{}'", self.name),
                    format!("document {} is not an object", id),
                )
                .into());
            };
            table.insert(id, body);
        }
        Ok(table)
    }

    pub(crate) fn insert(&mut self, body: Map<String, Value>) -> TableResult<DocId> {
        let mut ids = self.insert_multiple(vec![body])?;
        Ok(ids.remove(0))
    }

    pub(crate) fn insert_multiple(
        &mut self,
        bodies: Vec<Map<String, Value>>,
    ) -> TableResult<Vec<DocId>> {
        let mut next_id = self.next_id;
        let ids = self.update_table(|table| {
            let mut ids = Vec::with_capacity(bodies.len());
            for body in bodies {
                let id = next_id
                    .unwrap_or_else(|| table.keys().next_back().map_or(1, |max| max + 1));
                next_id = Some(id + 1);
                table.insert(id, body);
                ids.push(id);
            }
            Ok(ids)
        })?;
        self.next_id = next_id;
        Ok(ids)
    }

    pub(crate) fn all(&self) -> TableResult<Vec<Document>> {
        Ok(self
            .read_table()?
            .into_iter()
            .map(|(id, body)| Document::new(id, body))
            .collect())
    }

    /// Matching documents: served from the result cache when present,
    /// otherwise scanned and cached.
    pub(crate) fn search(&mut self, predicate: &Predicate) -> TableResult<Vec<Document>> {
        if let Some(ids) = self.query_cache.get(predicate).map(<[DocId]>::to_vec) {
            return self.resolve(&ids);
        }

        let docs: Vec<Document> = self
            .read_table()?
            .into_iter()
            .filter(|(_, body)| predicate.matches(body))
            .map(|(id, body)| Document::new(id, body))
            .collect();

        self.query_cache
            .set(predicate.clone(), docs.iter().map(|d| d.id).collect());
        Ok(docs)
    }

    /// First match in id order
    pub(crate) fn get(&self, predicate: &Predicate) -> TableResult<Option<Document>> {
        Ok(self
            .read_table()?
            .into_iter()
            .find(|(_, body)| predicate.matches(body))
            .map(|(id, body)| Document::new(id, body)))
    }

    pub(crate) fn get_by_id(&self, id: DocId) -> TableResult<Option<Document>> {
        Ok(self
            .read_table()?
            .remove(&id)
            .map(|body| Document::new(id, body)))
    }

    /// Documents for `ids` in the given order; unknown ids are skipped
    pub(crate) fn resolve(&self, ids: &[DocId]) -> TableResult<Vec<Document>> {
        let table = self.read_table()?;
        Ok(ids
            .iter()
            .filter_map(|id| table.get(id).map(|body| Document::new(*id, body.clone())))
            .collect())
    }

    pub(crate) fn truncate(&mut self) -> TableResult<()> {
        self.update_table(|table| {
            table.clear();
            Ok(())
        })?;
        self.next_id = None;
        Ok(())
    }

    pub(crate) fn len(&self) -> TableResult<usize> {
        Ok(self.read_table()?.len())
    }
}
