//! Named tables over one storage backend
//!
//! A database hands out one `IndexedTable` per table name. Every handle
//! shares the same storage, so writes through one table keep the others'
//! persisted documents intact.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::storage::{shared, SharedStorage, Storage};
use crate::table::{IndexedTable, TableConfig, TableError, TableResult};

/// A set of tables sharing one storage backend
pub struct Database {
    storage: SharedStorage,
    tables: HashMap<String, IndexedTable>,
}

impl Database {
    pub fn new<S: Storage + 'static>(storage: S) -> Self {
        Self::from_shared(shared(storage))
    }

    pub fn from_shared(storage: SharedStorage) -> Self {
        Self {
            storage,
            tables: HashMap::new(),
        }
    }

    /// Open the table described by `config`.
    ///
    /// An already open table is returned as is when `config` matches the one
    /// it was opened with.
    pub fn table(&mut self, config: TableConfig) -> TableResult<&mut IndexedTable> {
        match self.tables.entry(config.name.clone()) {
            Entry::Occupied(entry) => {
                if entry.get().config() != &config {
                    return Err(TableError::ConfigMismatch { name: config.name });
                }
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let table = IndexedTable::open(self.storage.clone(), config)?;
                Ok(entry.insert(table))
            }
        }
    }

    /// The `_default` table, with no indexes
    pub fn default_table(&mut self) -> TableResult<&mut IndexedTable> {
        self.table(TableConfig::default())
    }

    /// Names of every table with persisted data
    pub fn table_names(&self) -> TableResult<Vec<String>> {
        let tables = self.storage.borrow_mut().read()?;
        Ok(tables.map(|t| t.into_keys().collect()).unwrap_or_default())
    }

    pub fn storage(&self) -> SharedStorage {
        self.storage.clone()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut open: Vec<&String> = self.tables.keys().collect();
        open.sort();
        f.debug_struct("Database").field("open_tables", &open).finish()
    }
}
