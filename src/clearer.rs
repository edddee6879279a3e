//! Deletes every cookie a page can see and wipes its storage areas.
//!
//! Pages cannot delete a cookie directly and cannot learn which domain or
//! path it was scoped to, so each name is overwritten with an already-expired
//! cookie under every plausible scope. Nothing here confirms that a cookie is
//! gone; HTTP-only cookies are never even seen.

use crate::cookie::SetCookie;
use crate::page::PageLocation;
use crate::store::{CookieStore, Result, StorageArea, StorageError, StorageKind};
use tracing::{debug, info};

#[derive(Debug)]
pub struct StorageOutcome {
    pub kind: StorageKind,
    pub result: std::result::Result<(), StorageError>,
}

/// What was attempted. Callers must not read it as what succeeded.
#[derive(Debug)]
pub struct ClearReport {
    pub names: Vec<String>,
    pub attempts: Vec<SetCookie>,
    pub storage: Vec<StorageOutcome>,
}

impl ClearReport {
    pub fn storage_failures(&self) -> impl Iterator<Item = &StorageError> {
        self.storage.iter().filter_map(|o| o.result.as_ref().err())
    }
}

/// Cookie names in a `document.cookie` string, in order.
pub fn cookie_names(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(';')
        .map(|cookie| {
            let name = cookie.split_once('=').map_or(cookie, |(name, _)| name);
            name.trim().to_string()
        })
        .collect()
}

/// Deletion writes for one name: unscoped first, then every domain and path
/// candidate of the page.
pub fn deletions_for(name: &str, page: &PageLocation) -> Vec<SetCookie> {
    let domains = page.domain_candidates();
    let paths = page.path_candidates();

    let mut deletions = Vec::with_capacity(1 + domains.len() * paths.len());
    deletions.push(SetCookie::deletion(name));
    for domain in &domains {
        for path in &paths {
            deletions.push(
                SetCookie::deletion(name)
                    .with_path(path.as_str())
                    .with_domain(domain.as_str()),
            );
        }
    }
    deletions
}

pub fn clear_all<S: CookieStore + ?Sized>(
    page: &PageLocation,
    cookies: &mut S,
    storage: &mut [&mut dyn StorageArea],
) -> Result<ClearReport> {
    let names = cookie_names(&cookies.cookie_string()?);

    let mut attempts = Vec::new();
    for name in &names {
        for deletion in deletions_for(name, page) {
            cookies.write(&deletion)?;
            attempts.push(deletion);
        }
    }

    let storage = storage
        .iter_mut()
        .map(|area| {
            let result = area.clear();
            if let Err(e) = &result {
                debug!(error = %e, "Ignoring storage clear failure");
            }
            StorageOutcome {
                kind: area.kind(),
                result,
            }
        })
        .collect();

    info!(?names, "Attempted to remove cookies");

    Ok(ClearReport {
        names,
        attempts,
        storage,
    })
}
