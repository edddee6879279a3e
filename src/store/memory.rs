use super::{CookieStore, Result, StorageArea, StorageError, StorageKind};
use crate::cookie::jar::{self, JarChange};
use crate::cookie::{SetCookie, StoredCookie};
use crate::page::PageLocation;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::debug;

/// An in-memory cookie jar viewed from one page, following the same
/// read/write rules a browser applies to `document.cookie`.
///
/// Every write is recorded as the string a script would have assigned.
#[derive(Debug, Clone)]
pub struct MemoryJar {
    page: PageLocation,
    cookies: Vec<StoredCookie>,
    now: Option<DateTime<Utc>>,
    writes: Vec<String>,
}

impl MemoryJar {
    pub fn new(page: PageLocation) -> Self {
        Self {
            page,
            cookies: Vec::new(),
            now: None,
            writes: Vec::new(),
        }
    }

    /// A jar pre-filled with cookies, including ones a script could not have
    /// set itself (HTTP-only, other paths).
    pub fn with_cookies(page: PageLocation, cookies: Vec<StoredCookie>) -> Self {
        Self {
            cookies,
            ..Self::new(page)
        }
    }

    /// Pins the jar's clock.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Equivalent of `document.cookie = raw`.
    pub fn set(&mut self, raw: &str) {
        self.apply(&SetCookie::parse(raw));
    }

    /// Everything held, visible to the page or not.
    pub fn cookies(&self) -> &[StoredCookie] {
        &self.cookies
    }

    pub fn writes(&self) -> &[String] {
        &self.writes
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    fn apply(&mut self, cookie: &SetCookie) {
        match jar::apply(&self.page, cookie, &self.cookies, self.now()) {
            JarChange::Upsert(stored) => {
                match self.cookies.iter_mut().find(|c| c.same_key(&stored)) {
                    Some(slot) => *slot = stored,
                    None => self.cookies.push(stored),
                }
            }
            JarChange::Remove(key) => self.cookies.retain(|c| !c.same_key(&key)),
            JarChange::Rejected(reason) => {
                debug!(name = %cookie.name, ?reason, "Cookie write ignored");
            }
        }
    }
}

impl CookieStore for MemoryJar {
    fn cookie_string(&self) -> Result<String> {
        let now = self.now();
        Ok(jar::cookie_string(&jar::visible(&self.page, &self.cookies, now)))
    }

    fn write(&mut self, cookie: &SetCookie) -> Result<()> {
        self.writes.push(cookie.to_string());
        self.apply(cookie);
        Ok(())
    }
}

/// An in-memory storage area. An unavailable area fails every `clear`, like
/// storage access inside a sandboxed frame.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    kind: StorageKind,
    entries: BTreeMap<String, String>,
    unavailable: Option<String>,
}

impl MemoryStorage {
    pub fn new(kind: StorageKind) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
            unavailable: None,
        }
    }

    pub fn unavailable(kind: StorageKind, reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::new(kind)
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StorageArea for MemoryStorage {
    fn kind(&self) -> StorageKind {
        self.kind
    }

    fn clear(&mut self) -> std::result::Result<(), StorageError> {
        if let Some(reason) = &self.unavailable {
            return Err(StorageError::Unavailable {
                kind: self.kind,
                reason: reason.clone(),
            });
        }
        self.entries.clear();
        Ok(())
    }
}
