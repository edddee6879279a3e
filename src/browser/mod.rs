pub mod cookie_store;
pub mod detector;
pub mod storage;
pub mod types;

pub use cookie_store::FirefoxCookieStore;
pub use detector::BrowserDetector;
pub use storage::{FirefoxLocalStorage, FirefoxSessionStorage};
pub use types::{BrowserType, Profile};
