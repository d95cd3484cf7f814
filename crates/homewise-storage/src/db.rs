//! Shared redb database handle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::Database;

use crate::error::{Result, StorageError};

/// An open homewise database.
///
/// Both document stores share one database file; each uses its own table.
#[derive(Clone)]
pub struct HomewiseDb {
    db: Arc<Database>,
    /// Backing file for throwaway databases, kept only for context in logs.
    temp_path: Option<PathBuf>,
}

impl HomewiseDb {
    /// Open (or create) a database at the given path, creating parent
    /// directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = if path.exists() {
            Database::open(path).map_err(StorageError::from)?
        } else {
            Database::create(path).map_err(StorageError::from)?
        };
        tracing::debug!(path = %path.display(), "database opened");

        Ok(Self {
            db: Arc::new(db),
            temp_path: None,
        })
    }

    /// Throwaway database backed by a unique temp file. redb has no true
    /// in-memory mode, so tests get a fresh file per database.
    pub fn memory() -> Result<Self> {
        let temp_path =
            std::env::temp_dir().join(format!("homewise_{}.redb", uuid::Uuid::new_v4()));
        let db = Database::create(&temp_path).map_err(StorageError::from)?;
        Ok(Self {
            db: Arc::new(db),
            temp_path: Some(temp_path),
        })
    }

    pub(crate) fn raw(&self) -> &Database {
        &self.db
    }

    /// Path of the backing temp file, if this is a throwaway database.
    pub fn temp_path(&self) -> Option<&Path> {
        self.temp_path.as_deref()
    }
}
