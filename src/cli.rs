use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use crumb::config::{ConfigError, Settings};
use crumb::store::{MemoryJar, MemoryStorage, StorageArea, StorageKind, StoreError};
use crumb::{
    BrowserDetector, BrowserType, FirefoxCookieStore, FirefoxLocalStorage, FirefoxSessionStorage,
    ImportError, PageLocation, Profile, clear_all, export_cookies, import_cookies,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "crumb",
    about = "Clear, export and import the cookies a web page can see"
)]
pub struct Args {
    /// More log output (-v debug, -vv trace)
    #[arg(long, short, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(long, short, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct Target {
    /// Page whose cookies to act on (e.g. "https://example.com/account")
    #[arg(long, short)]
    pub url: String,

    /// Browser to use (firefox, librewolf, waterfox)
    #[arg(long, short)]
    pub browser: Option<String>,

    /// Browser profile name (e.g. "default-release")
    #[arg(long, short)]
    pub profile: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Delete every cookie the page can see and clear its storage
    Clear {
        #[command(flatten)]
        target: Target,

        /// Print the deletion writes without touching the profile
        #[arg(long)]
        dry_run: bool,
    },
    /// Save the page's cookies to <host>-cookies.json
    Export {
        #[command(flatten)]
        target: Target,

        /// Directory for the exported file
        #[arg(long, short)]
        output_dir: Option<PathBuf>,
    },
    /// Write cookies from a JSON array of cookie descriptors
    Import {
        #[command(flatten)]
        target: Target,

        /// JSON file to read; stdin when omitted or "-"
        #[arg(long, short)]
        file: Option<PathBuf>,
    },
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid page URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("{0}")]
    UnknownBrowser(String),

    #[error("{0} is not installed")]
    NotInstalled(String),

    #[error("Profile '{profile}' not found for {browser}")]
    ProfileNotFound { profile: String, browser: String },

    #[error("No {0} profile with a cookie database found")]
    NoProfiles(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn run(args: Args) -> Result<(), CliError> {
    let settings = Settings::load()?;
    match args.command {
        Command::Clear { target, dry_run } => clear(&target, &settings, dry_run),
        Command::Export { target, output_dir } => export(&target, &settings, output_dir),
        Command::Import { target, file } => import(&target, &settings, file.as_deref()),
    }
}

fn clear(target: &Target, settings: &Settings, dry_run: bool) -> Result<(), CliError> {
    let page = parse_page(&target.url)?;
    let profile = resolve_profile(target, settings)?;

    if dry_run {
        let snapshot = FirefoxCookieStore::snapshot(&profile, page.clone())?;
        let mut jar = MemoryJar::with_cookies(page.clone(), snapshot.stored_cookies()?);
        let mut local = MemoryStorage::new(StorageKind::Local);
        let mut session = MemoryStorage::new(StorageKind::Session);
        let mut areas: [&mut dyn StorageArea; 2] = [&mut local, &mut session];

        let report = clear_all(&page, &mut jar, &mut areas)?;
        for attempt in &report.attempts {
            println!("{}", attempt);
        }
        return Ok(());
    }

    let mut store = FirefoxCookieStore::open(&profile, page.clone())?;
    let mut local = FirefoxLocalStorage::for_page(&profile, &page);
    let mut session = FirefoxSessionStorage;
    let mut areas: [&mut dyn StorageArea; 2] = [&mut local, &mut session];

    let report = clear_all(&page, &mut store, &mut areas)?;
    for failure in report.storage_failures() {
        debug!(%failure, "Storage not cleared");
    }

    println!(
        "Attempted to remove {} cookies: {}",
        report.names.len(),
        report.names.join(", ")
    );
    Ok(())
}

fn export(
    target: &Target,
    settings: &Settings,
    output_dir: Option<PathBuf>,
) -> Result<(), CliError> {
    let page = parse_page(&target.url)?;
    let profile = resolve_profile(target, settings)?;

    // A copy is enough for reading and works while the browser is open
    let store = FirefoxCookieStore::snapshot(&profile, page.clone())?;
    let export = export_cookies(&page, &store, Utc::now())?;

    let dir = output_dir
        .or_else(|| settings.export_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir)?;
    let path = export.save(&dir)?;

    println!(
        "Exported {} cookies to {}",
        export.document.cookies.len(),
        path.display()
    );
    Ok(())
}

fn import(target: &Target, settings: &Settings, file: Option<&Path>) -> Result<(), CliError> {
    let page = parse_page(&target.url)?;
    let profile = resolve_profile(target, settings)?;

    let json = match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)?,
        _ => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let mut store = FirefoxCookieStore::open(&profile, page.clone())?;
    let tally = import_cookies(&json, &page, &mut store)?;

    println!(
        "Cookies processed: ok={}, skippedHttpOnly={}, skippedDomain={}, failed={}",
        tally.ok, tally.skipped_http_only, tally.skipped_domain, tally.failed
    );
    Ok(())
}

fn parse_page(url: &str) -> Result<PageLocation, CliError> {
    PageLocation::parse(url).map_err(|source| CliError::InvalidUrl {
        url: url.to_string(),
        source,
    })
}

fn resolve_profile(target: &Target, settings: &Settings) -> Result<Profile, CliError> {
    let browser_type = match target.browser.as_deref().or(settings.browser.as_deref()) {
        Some(name) => BrowserType::from_str(name).map_err(CliError::UnknownBrowser)?,
        None => BrowserType::Firefox,
    };

    let detector = BrowserDetector::new();
    if !detector.detect_browsers().contains(&browser_type) {
        return Err(CliError::NotInstalled(browser_type.name().to_string()));
    }

    let profile_name = target.profile.as_deref().or(settings.profile.as_deref());
    match (detector.get_profile(browser_type, profile_name), profile_name) {
        (Some(profile), _) => {
            debug!(browser = browser_type.name(), profile = %profile.name, path = ?profile.path, "Using profile");
            Ok(profile)
        }
        (None, Some(name)) => Err(CliError::ProfileNotFound {
            profile: name.to_string(),
            browser: browser_type.name().to_string(),
        }),
        (None, None) => Err(CliError::NoProfiles(browser_type.name().to_string())),
    }
}
