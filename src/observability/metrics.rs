//! Per-table operation counters
//!
//! Counters only, monotonic, never consulted by the read or write paths.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing how a table served reads and absorbed writes
#[derive(Debug, Default)]
pub struct TableMetrics {
    /// Searches answered from the result cache
    cache_hits: AtomicU64,
    /// Searches answered from a field index
    index_lookups: AtomicU64,
    /// Searches answered by scanning the whole table
    full_scans: AtomicU64,
    /// Documents inserted
    documents_inserted: AtomicU64,
    /// Documents rewritten by update
    documents_updated: AtomicU64,
    /// Documents removed
    documents_removed: AtomicU64,
    /// Truncate calls
    truncates: AtomicU64,
    /// Writes rejected before reaching storage
    writes_rejected: AtomicU64,
}

impl TableMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_index_lookups(&self) {
        self.index_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_full_scans(&self) {
        self.full_scans.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_inserted(&self, n: usize) {
        self.documents_inserted.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn add_updated(&self, n: usize) {
        self.documents_updated.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn add_removed(&self, n: usize) {
        self.documents_removed.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn increment_truncates(&self) {
        self.truncates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_writes_rejected(&self) {
        self.writes_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            index_lookups: self.index_lookups.load(Ordering::Relaxed),
            full_scans: self.full_scans.load(Ordering::Relaxed),
            documents_inserted: self.documents_inserted.load(Ordering::Relaxed),
            documents_updated: self.documents_updated.load(Ordering::Relaxed),
            documents_removed: self.documents_removed.load(Ordering::Relaxed),
            truncates: self.truncates.load(Ordering::Relaxed),
            writes_rejected: self.writes_rejected.load(Ordering::Relaxed),
        }
    }

    /// Counters as a single JSON object
    pub fn to_json(&self) -> String {
        let s = self.snapshot();
        format!(
            r#"{{"cache_hits":{},"index_lookups":{},"full_scans":{},"documents_inserted":{},"documents_updated":{},"documents_removed":{},"truncates":{},"writes_rejected":{}}}"#,
            s.cache_hits,
            s.index_lookups,
            s.full_scans,
            s.documents_inserted,
            s.documents_updated,
            s.documents_removed,
            s.truncates,
            s.writes_rejected,
        )
    }
}

/// A point-in-time snapshot of [`TableMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub index_lookups: u64,
    pub full_scans: u64,
    pub documents_inserted: u64,
    pub documents_updated: u64,
    pub documents_removed: u64,
    pub truncates: u64,
    pub writes_rejected: u64,
}
