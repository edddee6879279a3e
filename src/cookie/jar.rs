//! Script-facing cookie rules shared by every store backend.
//!
//! A page may only read cookies that are not HTTP-only and whose domain, path
//! and secure flag match it; a write may only scope a cookie to the page's
//! host or one of its parent domains, and can neither create nor replace an
//! HTTP-only cookie.

use super::set_cookie::SetCookie;
use super::types::SameSite;
use crate::page::PageLocation;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    /// Lowercase, without a leading dot.
    pub domain: String,
    pub host_only: bool,
    pub path: String,
    /// `None` for session cookies.
    pub expires: Option<DateTime<Utc>>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
    pub created: DateTime<Utc>,
}

impl StoredCookie {
    pub fn same_key(&self, other: &StoredCookie) -> bool {
        self.name == other.name
            && self.domain == other.domain
            && self.host_only == other.host_only
            && self.path == other.path
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    pub fn is_visible_to(&self, page: &PageLocation, now: DateTime<Utc>) -> bool {
        let domain_ok = if self.host_only {
            page.hostname() == self.domain
        } else {
            page.domain_matches(&self.domain)
        };

        !self.http_only
            && !self.is_expired(now)
            && domain_ok
            && page.path_matches(&self.path)
            && (!self.secure || page.is_secure())
    }

    /// The host column format used by Firefox-family stores: a leading dot
    /// marks a domain cookie.
    pub fn host_key(&self) -> String {
        if self.host_only {
            self.domain.clone()
        } else {
            format!(".{}", self.domain)
        }
    }
}

/// Why a store ignored a write. Pages get no signal for any of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    HttpOnlyFromScript,
    SecureFromInsecurePage,
    DomainMismatch(String),
    ProtectedByHttpOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JarChange {
    Upsert(StoredCookie),
    Remove(StoredCookie),
    Rejected(Rejection),
}

/// Whether a page may scope a cookie to `domain`.
///
/// Single-label domains other than the host itself (`com`, `io`) are
/// refused the way a public suffix would be. IP hosts only accept themselves.
pub fn accepts_domain(page: &PageLocation, domain: &str) -> bool {
    let domain = domain.trim_start_matches('.').to_ascii_lowercase();
    if !domain.is_empty() && domain == page.hostname() {
        return true;
    }
    !page.is_ip_host() && domain.contains('.') && page.domain_matches(&domain)
}

/// Resolves what a script write does to a store holding `existing`.
pub fn apply(
    page: &PageLocation,
    cookie: &SetCookie,
    existing: &[StoredCookie],
    now: DateTime<Utc>,
) -> JarChange {
    if cookie.http_only {
        return JarChange::Rejected(Rejection::HttpOnlyFromScript);
    }
    if cookie.secure && !page.is_secure() {
        return JarChange::Rejected(Rejection::SecureFromInsecurePage);
    }

    let (domain, host_only) = match cookie.domain.as_deref().filter(|d| !d.is_empty()) {
        Some(domain) => {
            if !accepts_domain(page, domain) {
                return JarChange::Rejected(Rejection::DomainMismatch(domain.to_string()));
            }
            (domain.trim_start_matches('.').to_ascii_lowercase(), false)
        }
        None => (page.hostname().to_string(), true),
    };

    let path = match cookie.path.as_deref() {
        Some(path) if path.starts_with('/') => path.to_string(),
        _ => page.default_cookie_path(),
    };

    // Max-Age wins over Expires
    let expires = match cookie.max_age {
        Some(seconds) if seconds <= 0 => Some(DateTime::<Utc>::MIN_UTC),
        Some(seconds) => Some(
            Duration::try_seconds(seconds)
                .and_then(|age| now.checked_add_signed(age))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        ),
        None => cookie.expires,
    };

    let mut stored = StoredCookie {
        name: cookie.name.clone(),
        value: cookie.value.clone(),
        domain,
        host_only,
        path,
        expires,
        secure: cookie.secure,
        http_only: false,
        same_site: cookie.same_site,
        created: now,
    };

    if let Some(previous) = existing.iter().find(|c| c.same_key(&stored)) {
        if previous.http_only {
            return JarChange::Rejected(Rejection::ProtectedByHttpOnly);
        }
        stored.created = previous.created;
    }

    if stored.is_expired(now) {
        JarChange::Remove(stored)
    } else {
        JarChange::Upsert(stored)
    }
}

/// Cookies the page can read, longest path first, then oldest first.
pub fn visible<'a>(
    page: &PageLocation,
    cookies: &'a [StoredCookie],
    now: DateTime<Utc>,
) -> Vec<&'a StoredCookie> {
    let mut visible: Vec<&StoredCookie> = cookies
        .iter()
        .filter(|c| c.is_visible_to(page, now))
        .collect();
    visible.sort_by(|a, b| {
        b.path
            .len()
            .cmp(&a.path.len())
            .then_with(|| a.created.cmp(&b.created))
    });
    visible
}

/// Joins cookies the way `document.cookie` presents them.
pub fn cookie_string(cookies: &[&StoredCookie]) -> String {
    cookies
        .iter()
        .map(|c| {
            if c.name.is_empty() {
                c.value.clone()
            } else {
                format!("{}={}", c.name, c.value)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
