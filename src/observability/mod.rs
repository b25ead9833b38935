//! Observability for indextable
//!
//! - Structured JSON logging with typed event names
//! - Per-table counters
//!
//! Observability is read-only: nothing here feeds back into how a query is
//! answered or how a write is applied.
//!
//! ```ignore
//! use indextable::observability::{Event, Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Info);
//! Logger::info(Event::TableOpened, &[("table", "users")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, TableMetrics};
