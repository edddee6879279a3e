//! Writes cookies described by a JSON array.
//!
//! Descriptor fields follow common extension exports:
//! `{"name":"session","value":"abc123","path":"/","domain":"example.com",
//!   "expires":"2026-12-31T23:59:59Z","secure":false,"sameSite":"Lax"}`.
//! Fields are read loosely: any falsy value counts as absent.

use crate::cookie::jar::accepts_domain;
use crate::cookie::{SameSite, SetCookie};
use crate::page::PageLocation;
use crate::store::{CookieStore, StoreError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use serde_json::Value;
use serde_json::value::RawValue;
use thiserror::Error;
use tracing::{error, info, warn};

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Numeric expiries below this are seconds, at or above it milliseconds.
const MILLIS_THRESHOLD: f64 = 1e12;

/// Largest instant a JavaScript `Date` can hold, in milliseconds.
const MAX_DATE_MILLIS: f64 = 8.64e15;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to parse cookie JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Parsed JSON is not an array (found {0})")]
    NotAnArray(&'static str),
}

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Invalid cookie JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cookie object missing name.")]
    MissingName,

    #[error("Invalid `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportTally {
    pub ok: usize,
    pub skipped_http_only: usize,
    /// Records whose `Domain` the page is not allowed to set.
    pub skipped_domain: usize,
    pub failed: usize,
}

enum Prepared {
    Write(SetCookie),
    SkipHttpOnly,
}

pub fn import_cookies<S: CookieStore + ?Sized>(
    json: &str,
    page: &PageLocation,
    store: &mut S,
) -> Result<ImportTally, ImportError> {
    // Elements are decoded one by one so a bad string escape fails only its record
    let records: Vec<&RawValue> = match serde_json::from_str(json) {
        Ok(records) => records,
        Err(e) => {
            let err = match serde_json::from_str::<Value>(json) {
                Ok(other) => ImportError::NotAnArray(json_type(&other)),
                Err(_) => ImportError::Parse(e),
            };
            error!(error = %err, "Failed to parse cookie JSON");
            return Err(err);
        }
    };

    let mut tally = ImportTally::default();

    for raw in records {
        match import_record(raw, page, store) {
            Ok(Some(true)) => tally.ok += 1,
            Ok(Some(false)) => tally.skipped_domain += 1,
            Ok(None) => tally.skipped_http_only += 1,
            Err(e) => {
                error!(record = raw.get(), error = %e, "Failed to set cookie");
                tally.failed += 1;
            }
        }
    }

    info!(
        ok = tally.ok,
        skipped_http_only = tally.skipped_http_only,
        skipped_domain = tally.skipped_domain,
        failed = tally.failed,
        "Cookies processed"
    );

    Ok(tally)
}

/// `Some(true)` written, `Some(false)` refused for its domain, `None` HTTP-only.
fn import_record<S: CookieStore + ?Sized>(
    raw: &RawValue,
    page: &PageLocation,
    store: &mut S,
) -> Result<Option<bool>, RecordError> {
    let record: Value = serde_json::from_str(raw.get())?;
    let cookie = match prepare(&record)? {
        Prepared::Write(cookie) => cookie,
        Prepared::SkipHttpOnly => return Ok(None),
    };

    if let Some(domain) = &cookie.domain
        && !accepts_domain(page, domain)
    {
        warn!(
            name = %cookie.name,
            %domain,
            hostname = page.hostname(),
            "Skipping cookie for a domain this page cannot set"
        );
        return Ok(Some(false));
    }

    store.write(&cookie)?;
    Ok(Some(true))
}

fn prepare(record: &Value) -> Result<Prepared, RecordError> {
    let field = |key: &str| record.get(key).filter(|v| truthy(v));

    let name = field("name").ok_or(RecordError::MissingName)?;
    if field("httpOnly").is_some() {
        return Ok(Prepared::SkipHttpOnly);
    }

    let name = js_string("name", name)?;
    let value = match record.get("value") {
        Some(value) => js_string("value", value)?,
        None => String::new(),
    };

    let mut cookie = SetCookie::new(encode_component(&name), encode_component(&value));

    if let Some(path) = field("path") {
        cookie.path = Some(js_string("path", path)?);
    }
    if let Some(domain) = field("domain") {
        cookie.domain = Some(js_string("domain", domain)?);
    }

    if let Some(expires) = field("expires") {
        cookie.expires = resolve_expires(expires);
    } else if let Some(max_age) = field("maxAge").or_else(|| field("max_age")) {
        cookie.max_age = resolve_max_age(max_age);
    }

    cookie.secure = field("secure").is_some();

    if let Some(same_site) = field("sameSite") {
        let raw = js_string("sameSite", same_site)?;
        let parsed = raw
            .parse::<SameSite>()
            .map_err(|reason| RecordError::InvalidField {
                field: "sameSite",
                reason,
            })?;
        cookie.same_site = Some(parsed);
    }

    Ok(Prepared::Write(cookie))
}

pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, URI_COMPONENT).to_string()
}

/// Numbers are epoch seconds below 1e12 and milliseconds otherwise; strings
/// are parsed as dates. Anything unparseable yields no expiry.
pub fn resolve_expires(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::Number(n) => {
            let n = n.as_f64()?;
            let millis = if n < MILLIS_THRESHOLD { n * 1000.0 } else { n };
            if !millis.is_finite() || millis.abs() > MAX_DATE_MILLIS {
                return None;
            }
            #[expect(clippy::cast_possible_truncation, reason = "range checked above")]
            let millis = millis.trunc() as i64;
            DateTime::from_timestamp_millis(millis)
        }
        Value::String(s) => parse_date(s.trim()),
        _ => None,
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Seconds, floored. Numeric strings are accepted.
pub fn resolve_max_age(raw: &Value) -> Option<i64> {
    let seconds = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(true) => 1.0,
        _ => return None,
    };
    if !seconds.is_finite() {
        return None;
    }
    #[expect(clippy::cast_possible_truncation, reason = "saturating float to int cast")]
    let seconds = seconds.floor() as i64;
    Some(seconds)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn js_string(field: &'static str, value: &Value) -> Result<String, RecordError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(js_number(n)),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Array(_) | Value::Object(_) => Err(RecordError::InvalidField {
            field,
            reason: format!("expected a string, found {}", json_type(value)),
        }),
    }
}

/// `String(n)` for a JSON number: integral floats drop their fraction and
/// magnitudes outside `[1e-6, 1e21)` use exponent form with a signed exponent.
fn js_number(n: &serde_json::Number) -> String {
    let Some(f) = n.as_f64().filter(|_| n.is_f64()) else {
        return n.to_string();
    };
    if f == 0.0 {
        return "0".to_string();
    }
    if (1e-6..1e21).contains(&f.abs()) {
        return f.to_string();
    }
    let exponent_form = format!("{f:e}");
    match exponent_form.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => exponent_form,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("session", "session")]
    #[case("a b", "a%20b")]
    #[case("x=y;z", "x%3Dy%3Bz")]
    #[case("-_.!~*'()", "-_.!~*'()")]
    #[case("ü", "%C3%BC")]
    fn test_encode_component(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(encode_component(raw), expected);
    }

    #[rstest]
    #[case(json!(1_700_000_000), Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap())]
    #[case(json!(1_700_000_000_000_i64), Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap())]
    #[case(json!("2026-12-31T23:59:59Z"), Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap())]
    #[case(json!("2026-12-31T23:59:59+02:00"), Utc.with_ymd_and_hms(2026, 12, 31, 21, 59, 59).unwrap())]
    #[case(json!("2026-12-31"), Utc.with_ymd_and_hms(2026, 12, 31, 0, 0, 0).unwrap())]
    #[case(json!("Thu, 31 Dec 2026 23:59:59 GMT"), Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap())]
    fn test_resolve_expires(#[case] raw: Value, #[case] expected: DateTime<Utc>) {
        assert_eq!(resolve_expires(&raw), Some(expected));
    }

    #[test]
    fn test_resolve_expires_invalid() {
        assert_eq!(resolve_expires(&json!("not a date")), None);
        assert_eq!(resolve_expires(&json!(1e300)), None);
        assert_eq!(resolve_expires(&json!(true)), None);
    }

    #[rstest]
    #[case(json!(3600), Some(3600))]
    #[case(json!(59.9), Some(59))]
    #[case(json!("120"), Some(120))]
    #[case(json!("soon"), None)]
    fn test_resolve_max_age(#[case] raw: Value, #[case] expected: Option<i64>) {
        assert_eq!(resolve_max_age(&raw), expected);
    }

    #[rstest]
    #[case(json!(42), "42")]
    #[case(json!(-7), "-7")]
    #[case(json!(100.0), "100")]
    #[case(json!(1.5), "1.5")]
    #[case(json!(-0.0), "0")]
    #[case(json!(1e21), "1e+21")]
    #[case(json!(1.5e300), "1.5e+300")]
    #[case(json!(1e-7), "1e-7")]
    #[case(json!(0.000_001), "0.000001")]
    #[case(json!(18_446_744_073_709_551_615_u64), "18446744073709551615")]
    fn test_number_to_string(#[case] raw: Value, #[case] expected: &str) {
        assert_eq!(js_string("value", &raw).unwrap(), expected);
    }

    #[test]
    fn test_prepare_full_record() {
        let record = json!({
            "name": "session id",
            "value": "a=b",
            "path": "/",
            "domain": "example.com",
            "expires": "2026-12-31T23:59:59Z",
            "maxAge": 60,
            "secure": true,
            "sameSite": "lax"
        });
        let Prepared::Write(cookie) = prepare(&record).unwrap() else {
            panic!("expected a write");
        };
        assert_eq!(
            cookie.to_string(),
            "session%20id=a%3Db; Path=/; Domain=example.com; \
             Expires=Thu, 31 Dec 2026 23:59:59 GMT; Secure; SameSite=Lax"
        );
    }

    #[test]
    fn test_prepare_max_age_alias_and_falsy_fields() {
        let record = json!({
            "name": "n",
            "value": 42,
            "path": "",
            "expires": 0,
            "max_age": "90.5",
            "secure": false
        });
        let Prepared::Write(cookie) = prepare(&record).unwrap() else {
            panic!("expected a write");
        };
        assert_eq!(cookie.to_string(), "n=42; Max-Age=90");
    }

    #[test]
    fn test_prepare_rejects_bad_fields() {
        assert!(matches!(prepare(&json!(null)), Err(RecordError::MissingName)));
        assert!(matches!(prepare(&json!({"name": ""})), Err(RecordError::MissingName)));
        assert!(matches!(
            prepare(&json!({"name": "a", "value": {"nested": true}})),
            Err(RecordError::InvalidField { field: "value", .. })
        ));
        assert!(matches!(
            prepare(&json!({"name": "a", "sameSite": "sometimes"})),
            Err(RecordError::InvalidField {
                field: "sameSite",
                ..
            })
        ));
    }

    #[test]
    fn test_bad_escape_fails_one_record() {
        let page = PageLocation::parse("https://example.com/").unwrap();
        let mut jar = crate::store::MemoryJar::new(page.clone());
        let json = r#"[{"name":"b","value":"\udc00x"}, {"name":"a","value":"1"}]"#;

        let tally = import_cookies(json, &page, &mut jar).unwrap();
        assert_eq!(tally.ok, 1);
        assert_eq!(tally.failed, 1);
        assert_eq!(jar.writes(), ["a=1"]);
    }

    #[test]
    fn test_http_only_checked_after_name() {
        assert!(matches!(
            prepare(&json!({"httpOnly": true})),
            Err(RecordError::MissingName)
        ));
        assert!(matches!(
            prepare(&json!({"name": "x", "httpOnly": 1})),
            Ok(Prepared::SkipHttpOnly)
        ));
    }
}
