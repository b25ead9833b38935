//! Predicate result cache
//!
//! Maps a predicate to the ids of the documents currently satisfying it.
//! Entries are created by reads and kept current by the write paths; nothing
//! here rescans the table.
//!
//! `append_if_matches` and `remove_if_present` are the per-entry primitives.
//! `apply_insert` and `apply_update` run them over every cached predicate.
//!
//! Maintenance visits entries in LRU order and never changes recency, so a
//! write does not make an entry look recently used.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::index::DocId;
use crate::planner::Predicate;

use super::lru::{CacheStats, LruCache};

/// Capacity-bounded cache of predicate results
#[derive(Debug, Clone)]
pub struct QueryCache {
    entries: LruCache<Predicate, Vec<DocId>>,
}

impl QueryCache {
    /// `None` is unbounded, `Some(0)` caches nothing
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.entries.capacity()
    }

    pub fn contains(&self, predicate: &Predicate) -> bool {
        self.entries.contains(predicate)
    }

    /// Cached ids, marking the entry as recently used
    pub fn get(&mut self, predicate: &Predicate) -> Option<&[DocId]> {
        self.entries.get(predicate).map(Vec::as_slice)
    }

    /// Cached ids without touching recency
    pub fn peek(&self, predicate: &Predicate) -> Option<&[DocId]> {
        self.entries.peek(predicate).map(Vec::as_slice)
    }

    pub fn set(&mut self, predicate: Predicate, ids: Vec<DocId>) {
        self.entries.insert(predicate, ids);
    }

    pub fn remove(&mut self, predicate: &Predicate) -> Option<Vec<DocId>> {
        self.entries.remove(predicate)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Cached predicates, least recently used first
    pub fn predicates(&self) -> Vec<Predicate> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> &CacheStats {
        self.entries.stats()
    }

    /// Appends `id` to the entry for `predicate` if the entry exists, the
    /// body satisfies the predicate and the id is not already listed.
    pub fn append_if_matches(
        &mut self,
        predicate: &Predicate,
        id: DocId,
        body: &Map<String, Value>,
    ) -> bool {
        if !predicate.matches(body) {
            return false;
        }
        match self.entries.peek_mut(predicate) {
            Some(ids) if !ids.contains(&id) => {
                ids.push(id);
                true
            }
            _ => false,
        }
    }

    /// Drops `id` from the entry for `predicate`, if present
    pub fn remove_if_present(&mut self, predicate: &Predicate, id: DocId) -> bool {
        let Some(ids) = self.entries.peek_mut(predicate) else {
            return false;
        };
        match ids.iter().position(|x| *x == id) {
            Some(pos) => {
                ids.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Adds a newly inserted document to every entry it satisfies
    pub fn apply_insert(&mut self, id: DocId, body: &Map<String, Value>) {
        for predicate in self.predicates() {
            self.append_if_matches(&predicate, id, body);
        }
    }

    /// Moves a replaced document between entries: dropped where the old body
    /// matched, appended where the new body matches.
    pub fn apply_update(
        &mut self,
        id: DocId,
        old: &Map<String, Value>,
        new: &Map<String, Value>,
    ) {
        for predicate in self.predicates() {
            if predicate.matches(old) {
                self.remove_if_present(&predicate, id);
            }
            self.append_if_matches(&predicate, id, new);
        }
    }

    /// Removal maintenance: the entry keyed by `removing` is evicted, every
    /// other entry drops the removed ids.
    pub fn retain_except(&mut self, removing: Option<&Predicate>, removed: &BTreeSet<DocId>) {
        if let Some(predicate) = removing {
            self.entries.remove(predicate);
        }
        if removed.is_empty() {
            return;
        }
        self.entries.for_each_mut(|_, ids| {
            ids.retain(|id| !removed.contains(id));
        });
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(Some(10))
    }
}
