use super::types::{BrowserType, Profile};
use std::path::{Path, PathBuf};

pub struct BrowserDetector {
    home_dir: PathBuf,
}

impl BrowserDetector {
    pub fn new() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self { home_dir }
    }

    pub fn with_home(home_dir: PathBuf) -> Self {
        Self { home_dir }
    }

    pub fn detect_browsers(&self) -> Vec<BrowserType> {
        BrowserType::ALL
            .into_iter()
            .filter(|browser_type| self.is_browser_installed(*browser_type))
            .collect()
    }

    fn is_browser_installed(&self, browser_type: BrowserType) -> bool {
        self.get_browser_base_path(browser_type)
            .is_some_and(|p| p.exists())
    }

    pub fn get_browser_base_path(&self, browser_type: BrowserType) -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            let support = self.home_dir.join("Library/Application Support");
            let path = match browser_type {
                BrowserType::Firefox => support.join("Firefox"),
                BrowserType::LibreWolf => support.join("librewolf"),
                BrowserType::Waterfox => support.join("Waterfox"),
            };
            Some(path)
        }

        #[cfg(target_os = "linux")]
        {
            let path = match browser_type {
                BrowserType::Firefox => self.home_dir.join(".mozilla/firefox"),
                BrowserType::LibreWolf => self.home_dir.join(".librewolf"),
                BrowserType::Waterfox => self.home_dir.join(".waterfox"),
            };
            Some(path)
        }

        #[cfg(target_os = "windows")]
        {
            let app_data = std::env::var("APPDATA").ok()?;
            let roaming_base = PathBuf::from(app_data);
            let path = match browser_type {
                BrowserType::Firefox => roaming_base.join("Mozilla\\Firefox"),
                BrowserType::LibreWolf => roaming_base.join("librewolf"),
                BrowserType::Waterfox => roaming_base.join("Waterfox"),
            };
            Some(path)
        }

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            let _ = browser_type;
            None
        }
    }

    /// Profiles listed in `profiles.ini` that have a cookie database, the
    /// one the browser starts with first.
    pub fn list_profiles(&self, browser_type: BrowserType) -> Vec<Profile> {
        let base_path = match self.get_browser_base_path(browser_type) {
            Some(p) if p.exists() => p,
            _ => return Vec::new(),
        };

        let Ok(content) = std::fs::read_to_string(base_path.join("profiles.ini")) else {
            return Vec::new();
        };

        parse_profiles_ini(&base_path, &content)
            .into_iter()
            .filter(|entry| entry.path.join("cookies.sqlite").exists())
            .map(|entry| Profile::new(entry.name, entry.path, browser_type))
            .collect()
    }

    /// The named profile, or the browser's default one.
    pub fn get_profile(
        &self,
        browser_type: BrowserType,
        profile_name: Option<&str>,
    ) -> Option<Profile> {
        let profiles = self.list_profiles(browser_type);

        match profile_name {
            Some(name) => profiles.into_iter().find(|p| p.name == name),
            None => profiles.into_iter().next(),
        }
    }
}

impl Default for BrowserDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// One `[Profile*]` section of `profiles.ini`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniProfile {
    pub name: String,
    pub path: PathBuf,
    /// `Default=1` in the section.
    pub is_default: bool,
}

/// Every `[Profile*]` section, ordered the way the browser picks one on
/// startup: the first `[Install*]` section's `Default=` profile, then
/// profiles flagged `Default=1`, then file order.
pub fn parse_profiles_ini(base_path: &Path, content: &str) -> Vec<IniProfile> {
    let resolve = |path: &str, is_relative: bool| {
        if is_relative {
            base_path.join(path)
        } else {
            PathBuf::from(path)
        }
    };

    let mut profiles = Vec::new();
    let mut install_default: Option<PathBuf> = None;
    let mut in_profile = false;
    let mut in_install = false;
    let mut name: Option<String> = None;
    let mut path: Option<String> = None;
    let mut is_relative = true;
    let mut is_default = false;

    let mut flush =
        |name: Option<String>, path: Option<String>, is_relative: bool, is_default: bool| {
            if let (Some(name), Some(path)) = (name, path) {
                profiles.push(IniProfile {
                    name,
                    path: resolve(&path, is_relative),
                    is_default,
                });
            }
        };

    for line in content.lines() {
        let line = line.trim();

        if line.starts_with('[') {
            flush(name.take(), path.take(), is_relative, is_default);
            is_relative = true;
            is_default = false;
            in_profile = line.starts_with("[Profile");
            in_install = line.starts_with("[Install");
        } else if let Some((key, value)) = line.split_once('=') {
            match (key, in_install, in_profile) {
                ("Default", true, _) if install_default.is_none() => {
                    install_default = Some(resolve(value, !Path::new(value).is_absolute()));
                }
                ("Name", _, true) => name = Some(value.to_string()),
                ("Path", _, true) => path = Some(value.to_string()),
                ("IsRelative", _, true) => is_relative = value.trim() == "1",
                ("Default", _, true) => is_default = value.trim() == "1",
                _ => {}
            }
        }
    }

    flush(name, path, is_relative, is_default);

    // stable sort, ties keep file order
    profiles.sort_by_key(|profile| {
        if install_default.as_ref() == Some(&profile.path) {
            0
        } else if profile.is_default {
            1
        } else {
            2
        }
    });

    profiles
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILES_INI: &str = "\
[Install4F96D1932A9F858E]
Default=abcd.default-release
Locked=1

[Profile1]
Name=default
IsRelative=1
Path=efgh.default

[Profile0]
Name=default-release
IsRelative=1
Path=abcd.default-release
Default=1

[Profile2]
Name=work
IsRelative=0
Path=/srv/profiles/work

[General]
StartWithLastProfile=1
Version=2
";

    fn names(profiles: &[IniProfile]) -> Vec<&str> {
        profiles.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_parse_profiles_ini() {
        let base = Path::new("/home/u/.mozilla/firefox");
        let profiles = parse_profiles_ini(base, PROFILES_INI);
        assert_eq!(
            profiles,
            vec![
                IniProfile {
                    name: "default-release".to_string(),
                    path: base.join("abcd.default-release"),
                    is_default: true,
                },
                IniProfile {
                    name: "default".to_string(),
                    path: base.join("efgh.default"),
                    is_default: false,
                },
                IniProfile {
                    name: "work".to_string(),
                    path: PathBuf::from("/srv/profiles/work"),
                    is_default: false,
                },
            ]
        );
    }

    #[test]
    fn test_install_default_beats_default_flag() {
        let content = "\
[Profile0]
Name=old
Path=old.default
Default=1

[Profile1]
Name=work
Path=work.default

[Install308046B0AF4A39CB]
Default=work.default
";
        let profiles = parse_profiles_ini(Path::new("/base"), content);
        assert_eq!(names(&profiles), ["work", "old"]);
    }

    #[test]
    fn test_default_flag_without_install_section() {
        let content = "\
[Profile0]
Name=first
Path=a

[Profile1]
Name=second
Path=b

[Profile2]
Name=flagged
Path=c
Default=1
";
        let profiles = parse_profiles_ini(Path::new("/base"), content);
        assert_eq!(names(&profiles), ["flagged", "first", "second"]);
    }

    #[test]
    fn test_install_section_is_not_a_profile() {
        let profiles = parse_profiles_ini(Path::new("/base"), "[Install1]\nDefault=x\nPath=x\n");
        assert!(profiles.is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_list_profiles_requires_cookie_database() {
        let home = tempfile::tempdir().unwrap();
        let base = home.path().join(".mozilla/firefox");
        std::fs::create_dir_all(base.join("abcd.default-release")).unwrap();
        std::fs::create_dir_all(base.join("efgh.default")).unwrap();
        std::fs::write(base.join("abcd.default-release/cookies.sqlite"), b"").unwrap();
        std::fs::write(base.join("profiles.ini"), PROFILES_INI).unwrap();

        let detector = BrowserDetector::with_home(home.path().to_path_buf());
        assert_eq!(detector.detect_browsers(), vec![BrowserType::Firefox]);

        let profiles = detector.list_profiles(BrowserType::Firefox);
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, "default-release");
        assert!(detector.get_profile(BrowserType::Firefox, Some("default")).is_none());
        assert!(detector.list_profiles(BrowserType::Waterfox).is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_default_profile_listed_second_is_chosen() {
        let home = tempfile::tempdir().unwrap();
        let base = home.path().join(".mozilla/firefox");
        for dir in ["abcd.default-release", "efgh.default"] {
            std::fs::create_dir_all(base.join(dir)).unwrap();
            std::fs::write(base.join(dir).join("cookies.sqlite"), b"").unwrap();
        }
        std::fs::write(base.join("profiles.ini"), PROFILES_INI).unwrap();

        let detector = BrowserDetector::with_home(home.path().to_path_buf());
        let profile = detector.get_profile(BrowserType::Firefox, None).unwrap();
        assert_eq!(profile.name, "default-release");
        assert_eq!(profile.path, base.join("abcd.default-release"));

        let named = detector
            .get_profile(BrowserType::Firefox, Some("default"))
            .unwrap();
        assert_eq!(named.path, base.join("efgh.default"));
    }
}
