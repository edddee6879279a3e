pub mod memory;

pub use memory::{MemoryJar, MemoryStorage};

use crate::cookie::{CookiePair, SetCookie};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[cfg(feature = "browser")]
    #[error("Database error: {0}")]
    DatabaseError(rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Cookie database not found: {0}")]
    NotFound(String),

    #[error("Cookie database is locked (is the browser still running?): {0}")]
    Locked(String),
}

#[cfg(feature = "browser")]
impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
                StoreError::Locked(err.to_string())
            }
            _ => StoreError::DatabaseError(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A page's view of a cookie store: read everything the page may see as one
/// string, write one cookie at a time.
///
/// Writes report backend failures only. Whether the cookie was accepted is
/// not observable, just as it is not for a page script.
pub trait CookieStore {
    fn cookie_string(&self) -> Result<String>;

    fn write(&mut self, cookie: &SetCookie) -> Result<()>;

    fn read_all(&self) -> Result<Vec<CookiePair>> {
        Ok(CookiePair::parse_list(&self.cookie_string()?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Local,
    Session,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Local => f.write_str("local"),
            StorageKind::Session => f.write_str("session"),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{kind} storage is unavailable: {reason}")]
    Unavailable { kind: StorageKind, reason: String },

    #[cfg(feature = "browser")]
    #[error("{kind} storage database error: {source}")]
    Database {
        kind: StorageKind,
        source: rusqlite::Error,
    },
}

/// A key-value storage area bound to one origin.
pub trait StorageArea {
    fn kind(&self) -> StorageKind;

    fn clear(&mut self) -> std::result::Result<(), StorageError>;
}
