use crate::cookie::CookiePair;
use crate::page::PageLocation;
use crate::store::{CookieStore, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// The exported JSON document. Only names and values are included since that
/// is all a page can read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub exported_at: String,
    pub origin: String,
    pub cookies: Vec<CookiePair>,
}

#[derive(Debug, Clone)]
pub struct CookieExport {
    pub file_name: String,
    pub document: ExportDocument,
}

impl CookieExport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.document)
    }

    /// Writes the document into `dir` under its download name.
    pub fn save(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

/// `<hostname>-cookies.json`, or `site-cookies.json` for pages without a host.
pub fn export_file_name(page: &PageLocation) -> String {
    let host = if page.hostname().is_empty() {
        "site"
    } else {
        page.hostname()
    };
    format!("{}-cookies.json", host)
}

pub fn export_cookies<S: CookieStore + ?Sized>(
    page: &PageLocation,
    store: &S,
    now: DateTime<Utc>,
) -> Result<CookieExport> {
    let cookies = store.read_all()?;

    info!("Exported {} cookies", cookies.len());

    Ok(CookieExport {
        file_name: export_file_name(page),
        document: ExportDocument {
            exported_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            origin: page.origin().to_string(),
            cookies,
        },
    })
}
