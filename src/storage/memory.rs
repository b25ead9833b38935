//! In-process storage

use super::errors::StorageResult;
use super::{Storage, Tables};

/// Keeps the last written tables in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    memory: Option<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&mut self) -> StorageResult<Option<Tables>> {
        Ok(self.memory.clone())
    }

    fn write(&mut self, tables: &Tables) -> StorageResult<()> {
        self.memory = Some(tables.clone());
        Ok(())
    }
}
