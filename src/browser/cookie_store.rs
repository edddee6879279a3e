use super::types::Profile;
use crate::cookie::jar::{self, JarChange};
use crate::cookie::{SameSite, SetCookie, StoredCookie};
use crate::page::PageLocation;
use crate::store::{CookieStore, Result, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params, params_from_iter};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tracing::debug;

/// `expiry` written for session cookies, which the database cannot express:
/// 9999-12-31T23:59:59Z.
const SESSION_EXPIRY: i64 = 253_402_300_799;

/// A page's view of a Firefox-family `cookies.sqlite`.
///
/// Only cookies outside any container or partition (empty
/// `originAttributes`) are read or written. The browser must be closed while
/// writing; otherwise it overwrites the database from memory on exit.
pub struct FirefoxCookieStore {
    conn: Connection,
    page: PageLocation,
    now: Option<DateTime<Utc>>,
    _snapshot: Option<TempDir>,
}

impl FirefoxCookieStore {
    /// Opens the profile's database in place for reading and writing.
    pub fn open(profile: &Profile, page: PageLocation) -> Result<Self> {
        Self::open_path(&profile.cookies_path(), page)
    }

    /// Opens a private copy of the profile's database, safe to use while the
    /// browser is running. Writes never reach the profile.
    pub fn snapshot(profile: &Profile, page: PageLocation) -> Result<Self> {
        let cookies_path = profile.cookies_path();
        if !cookies_path.exists() {
            return Err(StoreError::NotFound(format!("{:?}", cookies_path)));
        }

        let temp_dir = tempfile::tempdir()?;
        let temp_cookies = temp_dir.path().join("cookies.sqlite");
        std::fs::copy(&cookies_path, &temp_cookies)?;

        // Recent writes may still sit in the write-ahead log
        let wal = profile.path.join("cookies.sqlite-wal");
        if wal.exists() {
            std::fs::copy(&wal, temp_dir.path().join("cookies.sqlite-wal"))?;
        }

        Ok(Self {
            conn: connect(&temp_cookies)?,
            page,
            now: None,
            _snapshot: Some(temp_dir),
        })
    }

    pub fn open_path(path: &Path, page: PageLocation) -> Result<Self> {
        Ok(Self {
            conn: connect(path)?,
            page,
            now: None,
            _snapshot: None,
        })
    }

    /// Pins the store's clock.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Every cookie stored under the page's host or one of its parent
    /// domains, visible to the page or not, oldest first.
    pub fn stored_cookies(&self) -> Result<Vec<StoredCookie>> {
        let hosts: Vec<String> = self
            .page
            .domain_candidates()
            .into_iter()
            .flat_map(|domain| [format!(".{}", domain), domain])
            .collect();

        if hosts.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; hosts.len()].join(", ");
        let sql = format!(
            "SELECT name, value, host, path, expiry, creationTime, isSecure, isHttpOnly, sameSite
             FROM moz_cookies
             WHERE originAttributes = '' AND host IN ({})
             ORDER BY creationTime ASC",
            placeholders
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let cookie_iter = stmt.query_map(params_from_iter(hosts.iter()), |row| {
            let name: String = row.get(0)?;
            let value: String = row.get(1)?;
            let host: String = row.get(2)?;
            let path: String = row.get(3)?;
            let expiry: i64 = row.get(4)?;
            let creation_time: i64 = row.get(5)?;
            let is_secure: i32 = row.get(6)?;
            let is_httponly: i32 = row.get(7)?;
            let same_site: i32 = row.get(8)?;

            Ok(StoredCookie {
                name,
                value,
                domain: host.trim_start_matches('.').to_string(),
                host_only: !host.starts_with('.'),
                path,
                expires: DateTime::from_timestamp(expiry, 0),
                secure: is_secure != 0,
                http_only: is_httponly != 0,
                same_site: same_site_from_db(same_site),
                created: DateTime::from_timestamp_micros(creation_time).unwrap_or_default(),
            })
        })?;

        let mut cookies = Vec::new();
        for cookie_result in cookie_iter {
            cookies.push(cookie_result?);
        }

        Ok(cookies)
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    fn upsert(&self, cookie: &StoredCookie, now: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO moz_cookies
                 (originAttributes, name, value, host, path, expiry, lastAccessed, creationTime,
                  isSecure, isHttpOnly, sameSite)
             VALUES ('', ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)
             ON CONFLICT (name, host, path, originAttributes) DO UPDATE SET
                 value = excluded.value,
                 expiry = excluded.expiry,
                 lastAccessed = excluded.lastAccessed,
                 isSecure = excluded.isSecure,
                 sameSite = excluded.sameSite",
            params![
                cookie.name,
                cookie.value,
                cookie.host_key(),
                cookie.path,
                cookie.expires.map_or(SESSION_EXPIRY, |e| e.timestamp()),
                now.timestamp_micros(),
                cookie.created.timestamp_micros(),
                cookie.secure,
                same_site_to_db(cookie.same_site),
            ],
        )?;
        Ok(())
    }

    fn remove(&self, cookie: &StoredCookie) -> Result<()> {
        let removed = self.conn.execute(
            "DELETE FROM moz_cookies
             WHERE originAttributes = '' AND name = ?1 AND host = ?2 AND path = ?3",
            params![cookie.name, cookie.host_key(), cookie.path],
        )?;
        debug!(name = %cookie.name, host = %cookie.host_key(), path = %cookie.path, removed, "Expired cookie");
        Ok(())
    }
}

impl CookieStore for FirefoxCookieStore {
    fn cookie_string(&self) -> Result<String> {
        let cookies = self.stored_cookies()?;
        Ok(jar::cookie_string(&jar::visible(&self.page, &cookies, self.now())))
    }

    fn write(&mut self, cookie: &SetCookie) -> Result<()> {
        let now = self.now();
        let existing = self.stored_cookies()?;

        match jar::apply(&self.page, cookie, &existing, now) {
            JarChange::Upsert(stored) => self.upsert(&stored, now),
            JarChange::Remove(stored) => self.remove(&stored),
            JarChange::Rejected(reason) => {
                debug!(name = %cookie.name, ?reason, "Cookie write ignored");
                Ok(())
            }
        }
    }
}

fn connect(path: &Path) -> Result<Connection> {
    if !path.exists() {
        return Err(StoreError::NotFound(format!("{:?}", path)));
    }

    let conn = Connection::open(path)?;
    conn.busy_timeout(Duration::from_millis(500))?;
    Ok(conn)
}

fn same_site_from_db(raw: i32) -> Option<SameSite> {
    match raw {
        1 => Some(SameSite::Lax),
        2 => Some(SameSite::Strict),
        _ => None,
    }
}

fn same_site_to_db(same_site: Option<SameSite>) -> i32 {
    match same_site {
        Some(SameSite::Lax) => 1,
        Some(SameSite::Strict) => 2,
        Some(SameSite::None) | None => 0,
    }
}
