use super::types::Profile;
use crate::page::PageLocation;
use crate::store::{StorageArea, StorageError, StorageKind};
use rusqlite::Connection;
use std::path::PathBuf;

/// An origin's local storage inside a Firefox-family profile.
pub struct FirefoxLocalStorage {
    db_path: PathBuf,
}

impl FirefoxLocalStorage {
    pub fn for_page(profile: &Profile, page: &PageLocation) -> Self {
        Self {
            db_path: profile.local_storage_path(page.origin()),
        }
    }
}

impl StorageArea for FirefoxLocalStorage {
    fn kind(&self) -> StorageKind {
        StorageKind::Local
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        // Nothing stored yet for this origin
        if !self.db_path.exists() {
            return Ok(());
        }

        let database = |source| StorageError::Database {
            kind: StorageKind::Local,
            source,
        };
        let conn = Connection::open(&self.db_path).map_err(database)?;
        conn.execute("DELETE FROM data", []).map_err(database)?;
        Ok(())
    }
}

/// Session storage is never written to disk, so it can only be cleared by the
/// browser holding it.
pub struct FirefoxSessionStorage;

impl StorageArea for FirefoxSessionStorage {
    fn kind(&self) -> StorageKind {
        StorageKind::Session
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        Err(StorageError::Unavailable {
            kind: StorageKind::Session,
            reason: "session storage only exists inside a running browser".to_string(),
        })
    }
}
