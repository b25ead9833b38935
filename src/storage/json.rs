//! Single-file JSON storage
//!
//! The whole database is one JSON object, rewritten on every write through a
//! temp file and a rename, so a crash leaves either the old or the new file:
//!
//! ```text
//! { "<table>": { "<doc id>": { ...body } } }
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::{Storage, Tables};

/// Storage backed by one JSON file
#[derive(Debug)]
pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    /// Open the file at `path`, creating it and its parent directories when
    /// missing.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
            }
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<file name>.tmp` next to the database file
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Makes the rename durable
    #[cfg(unix)]
    fn sync_parent(&self) -> StorageResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        File::open(dir)
            .and_then(|d| d.sync_all())
            .map_err(|e| StorageError::io(dir, e))
    }

    #[cfg(not(unix))]
    fn sync_parent(&self) -> StorageResult<()> {
        Ok(())
    }
}

impl Storage for JsonStorage {
    fn read(&mut self) -> StorageResult<Option<Tables>> {
        let mut contents = String::new();
        File::open(&self.path)
            .and_then(|mut f| f.read_to_string(&mut contents))
            .map_err(|e| StorageError::io(&self.path, e))?;

        if contents.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| StorageError::corrupt(self.path.display().to_string(), e.to_string()))
    }

    /// Replaces the file atomically: the new contents go to a sibling temp
    /// file, are synced, then renamed over the database file.
    fn write(&mut self, tables: &Tables) -> StorageResult<()> {
        let serialized = serde_json::to_vec(tables)?;
        let temp_path = self.temp_path();

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| StorageError::io(&temp_path, e))?;
        file.write_all(&serialized)
            .and_then(|_| file.sync_all())
            .map_err(|e| StorageError::io(&temp_path, e))?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(|e| StorageError::io(&self.path, e))?;
        self.sync_parent()
    }
}
