//! Observable table events
//!
//! Every log line carries exactly one of these event names.

use std::fmt;

/// Observable events emitted by indexed tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// A table handle was opened and its indexes populated
    TableOpened,
    /// A table was truncated
    TableTruncated,

    // Cache
    /// The result cache was cleared explicitly
    CacheCleared,

    // Writes
    /// A write was rejected before reaching storage
    WriteRejected,
    /// A remove call carried no selector
    RemoveRejected,

    // Storage
    /// A storage read or write failed
    StorageFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::TableOpened => "TABLE_OPENED",
            Event::TableTruncated => "TABLE_TRUNCATED",
            Event::CacheCleared => "QUERY_CACHE_CLEARED",
            Event::WriteRejected => "WRITE_REJECTED",
            Event::RemoveRejected => "REMOVE_REJECTED",
            Event::StorageFailed => "STORAGE_FAILED",
        }
    }

    /// Returns true if this event reports a caller or storage failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::WriteRejected | Event::RemoveRejected | Event::StorageFailed
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
