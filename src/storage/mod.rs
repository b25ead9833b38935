//! Table persistence
//!
//! A backend stores every table of a database as one unit: reads return the
//! whole map, writes replace it. Nothing here knows about indexes or caches.
//!
//! - `MemoryStorage`: in-process, lost on drop
//! - `JsonStorage`: one JSON file on disk

mod errors;
mod json;
mod memory;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;

pub use errors::{StorageError, StorageResult};
pub use json::JsonStorage;
pub use memory::MemoryStorage;

/// Documents of one table keyed by the decimal document id
pub type TableData = BTreeMap<String, Value>;

/// Every table in a database keyed by table name
pub type Tables = BTreeMap<String, TableData>;

/// Whole-database persistence backend
pub trait Storage {
    /// Current contents, or `None` when nothing was ever written
    fn read(&mut self) -> StorageResult<Option<Tables>>;

    /// Replace the stored contents
    fn write(&mut self, tables: &Tables) -> StorageResult<()>;
}

/// Storage handle shared by every table of a database
pub type SharedStorage = Rc<RefCell<dyn Storage>>;

/// Wrap a backend for sharing between table handles
pub fn shared<S: Storage + 'static>(storage: S) -> SharedStorage {
    Rc::new(RefCell::new(storage))
}
