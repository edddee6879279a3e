use json_comments::StripComments;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("HOME directory not found")]
    HomeNotFound,

    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Defaults for CLI flags, read from `~/.crumb/settings.json`. Comments are
/// allowed in the file.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub browser: Option<String>,
    pub profile: Option<String>,
    pub export_dir: Option<PathBuf>,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::settings_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Settings::default());
        }
        let file = std::fs::File::open(path)?;
        let settings: Settings = serde_json::from_reader(StripComments::new(file))?;
        Ok(settings)
    }

    fn settings_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".crumb").join("settings.json"))
    }
}
