use super::types::SameSite;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;

const EXPIRES_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// One cookie write, as a page script would assign it to `document.cookie`.
///
/// `name` and `value` are emitted verbatim; callers encode them first when
/// they need to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub max_age: Option<i64>,
    pub secure: bool,
    pub same_site: Option<SameSite>,
    pub http_only: bool,
}

impl SetCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            expires: None,
            max_age: None,
            secure: false,
            same_site: None,
            http_only: false,
        }
    }

    /// An empty-valued write that expired at the Unix epoch. Writing it is the
    /// only way a page can remove a cookie.
    pub fn deletion(name: impl Into<String>) -> Self {
        Self {
            expires: Some(DateTime::<Utc>::UNIX_EPOCH),
            ..Self::new(name, "")
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Parses a cookie string using the same lenient rules as a browser:
    /// unknown or malformed attributes are dropped, never rejected.
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split(';');
        let pair = parts.next().unwrap_or_default();
        let (name, value) = match pair.split_once('=') {
            Some((name, value)) => (name.trim(), value.trim()),
            None => ("", pair.trim()),
        };

        let mut cookie = SetCookie::new(name, value);

        for attribute in parts {
            let (key, val) = match attribute.split_once('=') {
                Some((key, val)) => (key.trim(), val.trim()),
                None => (attribute.trim(), ""),
            };

            match key.to_ascii_lowercase().as_str() {
                "path" if val.starts_with('/') => cookie.path = Some(val.to_string()),
                "domain" if !val.is_empty() => cookie.domain = Some(val.to_string()),
                "expires" => {
                    if let Some(expires) = parse_expires(val) {
                        cookie.expires = Some(expires);
                    }
                }
                "max-age" => {
                    if let Ok(seconds) = val.parse::<i64>() {
                        cookie.max_age = Some(seconds);
                    }
                }
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                "samesite" => cookie.same_site = val.parse().ok(),
                _ => {}
            }
        }

        cookie
    }
}

pub fn format_expires(expires: &DateTime<Utc>) -> String {
    expires.format(EXPIRES_FORMAT).to_string()
}

fn parse_expires(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, EXPIRES_FORMAT)
                .ok()
                .map(|naive| naive.and_utc())
        })
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(path) = &self.path {
            write!(f, "; Path={}", path)?;
        }
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={}", domain)?;
        }
        if let Some(expires) = &self.expires {
            write!(f, "; Expires={}", format_expires(expires))?;
        }
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age)?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        if let Some(same_site) = self.same_site {
            write!(f, "; SameSite={}", same_site)?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_display_plain() {
        assert_eq!(SetCookie::new("x", "1").to_string(), "x=1");
    }

    #[test]
    fn test_display_deletion() {
        let cookie = SetCookie::deletion("sid").with_path("/a").with_domain("b.com");
        assert_eq!(
            cookie.to_string(),
            "sid=; Path=/a; Domain=b.com; Expires=Thu, 01 Jan 1970 00:00:00 GMT"
        );
    }

    #[test]
    fn test_display_all_attributes() {
        let cookie = SetCookie {
            expires: Some(Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap()),
            max_age: Some(60),
            secure: true,
            same_site: Some(SameSite::Lax),
            ..SetCookie::new("session", "abc123")
                .with_path("/")
                .with_domain("example.com")
        };
        assert_eq!(
            cookie.to_string(),
            "session=abc123; Path=/; Domain=example.com; \
             Expires=Thu, 31 Dec 2026 23:59:59 GMT; Max-Age=60; Secure; SameSite=Lax"
        );
    }

    #[test]
    fn test_parse_attributes() {
        let cookie = SetCookie::parse(
            "a = b=c ; path=/docs; DOMAIN=.example.com; expires=Thu, 01 Jan 1970 00:00:00 GMT; \
             max-age=bogus; secure; HttpOnly; SameSite=strict; Priority=High",
        );
        assert_eq!(cookie.name, "a");
        assert_eq!(cookie.value, "b=c");
        assert_eq!(cookie.path.as_deref(), Some("/docs"));
        assert_eq!(cookie.domain.as_deref(), Some(".example.com"));
        assert_eq!(cookie.expires, Some(DateTime::<Utc>::UNIX_EPOCH));
        assert_eq!(cookie.max_age, None);
        assert!(cookie.secure);
        assert!(cookie.http_only);
        assert_eq!(cookie.same_site, Some(SameSite::Strict));
    }

    #[test]
    fn test_parse_drops_relative_path_and_bad_expiry() {
        let cookie = SetCookie::parse("a=1; Path=docs; Expires=someday; Max-Age=-1");
        assert_eq!(cookie.path, None);
        assert_eq!(cookie.expires, None);
        assert_eq!(cookie.max_age, Some(-1));
    }

    #[test]
    fn test_parse_nameless() {
        let cookie = SetCookie::parse("justvalue");
        assert_eq!(cookie.name, "");
        assert_eq!(cookie.value, "justvalue");
    }
}
