use serde::{Deserialize, Serialize};
use std::fmt;

/// A cookie as a page script sees it: a name and a value, nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookiePair {
    pub name: String,
    pub value: String,
}

impl CookiePair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parses a `document.cookie`-style string (`a=1; b=2`).
    ///
    /// Pairs are split on the first `=` only, so values may contain `=`. A
    /// piece without `=` becomes a cookie with that name and an empty value.
    pub fn parse_list(raw: &str) -> Vec<CookiePair> {
        raw.split("; ")
            .filter(|piece| !piece.is_empty())
            .map(|piece| match piece.split_once('=') {
                Some((name, value)) => CookiePair::new(name, value),
                None => CookiePair::new(piece, ""),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SameSite {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(SameSite::Strict),
            "lax" => Ok(SameSite::Lax),
            "none" => Ok(SameSite::None),
            other => Err(format!("Unknown SameSite value: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_two_pairs() {
        let pairs = CookiePair::parse_list("a=1; b=2");
        assert_eq!(pairs, vec![CookiePair::new("a", "1"), CookiePair::new("b", "2")]);
    }

    #[test]
    fn test_parse_list_splits_on_first_equals() {
        let pairs = CookiePair::parse_list("a=x=y");
        assert_eq!(pairs, vec![CookiePair::new("a", "x=y")]);
    }

    #[test]
    fn test_parse_list_nameless_and_empty() {
        assert!(CookiePair::parse_list("").is_empty());
        assert_eq!(
            CookiePair::parse_list("flag; c="),
            vec![CookiePair::new("flag", ""), CookiePair::new("c", "")]
        );
    }

    #[test]
    fn test_same_site_from_str() {
        assert_eq!("lax".parse::<SameSite>(), Ok(SameSite::Lax));
        assert_eq!("STRICT".parse::<SameSite>(), Ok(SameSite::Strict));
        assert_eq!("None".parse::<SameSite>(), Ok(SameSite::None));
        assert!("sometimes".parse::<SameSite>().is_err());
    }
}
