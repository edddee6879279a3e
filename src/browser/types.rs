use std::path::PathBuf;

/// Browsers sharing Firefox's profile layout (`profiles.ini`, `cookies.sqlite`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserType {
    Firefox,
    LibreWolf,
    Waterfox,
}

impl BrowserType {
    pub const ALL: [BrowserType; 3] = [
        BrowserType::Firefox,
        BrowserType::LibreWolf,
        BrowserType::Waterfox,
    ];

    pub fn name(&self) -> &str {
        match self {
            BrowserType::Firefox => "Firefox",
            BrowserType::LibreWolf => "LibreWolf",
            BrowserType::Waterfox => "Waterfox",
        }
    }
}

impl std::str::FromStr for BrowserType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "firefox" => Ok(BrowserType::Firefox),
            "librewolf" => Ok(BrowserType::LibreWolf),
            "waterfox" => Ok(BrowserType::Waterfox),
            other => Err(format!("Unknown browser: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub path: PathBuf,
    pub browser_type: BrowserType,
}

impl Profile {
    pub fn new(name: String, path: PathBuf, browser_type: BrowserType) -> Self {
        Self {
            name,
            path,
            browser_type,
        }
    }

    pub fn cookies_path(&self) -> PathBuf {
        self.path.join("cookies.sqlite")
    }

    /// Local storage database for one origin, e.g.
    /// `storage/default/https+++example.com+8443/ls/data.sqlite`.
    pub fn local_storage_path(&self, origin: &str) -> PathBuf {
        self.path
            .join("storage")
            .join("default")
            .join(origin_directory(origin))
            .join("ls")
            .join("data.sqlite")
    }
}

/// Directory name Firefox uses for an origin's storage.
pub fn origin_directory(origin: &str) -> String {
    origin.replacen("://", "+++", 1).replace(':', "+")
}
