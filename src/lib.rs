#[cfg(feature = "browser")]
pub mod browser;
pub mod clearer;
#[cfg(feature = "browser")]
pub mod config;
pub mod cookie;
pub mod exporter;
pub mod importer;
pub mod page;
pub mod store;

#[cfg(feature = "browser")]
pub use browser::{
    BrowserDetector, BrowserType, FirefoxCookieStore, FirefoxLocalStorage, FirefoxSessionStorage,
    Profile,
};
pub use clearer::{ClearReport, clear_all};
#[cfg(feature = "browser")]
pub use config::Settings;
pub use cookie::{CookiePair, SameSite, SetCookie, StoredCookie};
pub use exporter::{CookieExport, ExportDocument, export_cookies};
pub use importer::{ImportError, ImportTally, import_cookies};
pub use page::PageLocation;
pub use store::{CookieStore, MemoryJar, StorageArea, StoreError};
