pub mod jar;
pub mod set_cookie;
pub mod types;

pub use jar::{JarChange, Rejection, StoredCookie};
pub use set_cookie::SetCookie;
pub use types::{CookiePair, SameSite};
