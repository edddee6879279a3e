use url::Url;

/// The parts of a page's location that cookie operations depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    hostname: String,
    origin: String,
    pathname: String,
    secure: bool,
}

impl PageLocation {
    pub fn new(hostname: &str, origin: &str, pathname: &str, secure: bool) -> Self {
        let pathname = if pathname.starts_with('/') {
            pathname.to_string()
        } else {
            format!("/{pathname}")
        };
        Self {
            hostname: hostname.to_ascii_lowercase(),
            origin: origin.to_string(),
            pathname,
            secure,
        }
    }

    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        Url::parse(input).map(|url| Self::from_url(&url))
    }

    pub fn from_url(url: &Url) -> Self {
        Self::new(
            url.host_str().unwrap_or_default(),
            &url.origin().ascii_serialization(),
            url.path(),
            url.scheme() == "https",
        )
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Whether the hostname is an IPv4 or bracketed IPv6 address.
    pub fn is_ip_host(&self) -> bool {
        matches!(
            url::Host::parse(&self.hostname),
            Ok(url::Host::Ipv4(_) | url::Host::Ipv6(_))
        )
    }

    /// The hostname followed by each of its parent-domain suffixes.
    ///
    /// `a.b.com` yields `a.b.com`, `b.com`, `com`. An empty hostname (e.g. a
    /// `file:` page) yields nothing.
    pub fn domain_candidates(&self) -> Vec<String> {
        if self.hostname.is_empty() {
            return Vec::new();
        }

        let labels: Vec<&str> = self.hostname.split('.').collect();
        (0..labels.len()).map(|i| labels[i..].join(".")).collect()
    }

    /// `/` plus every prefix of the page path, skipping empty segments.
    pub fn path_candidates(&self) -> Vec<String> {
        let mut paths = vec!["/".to_string()];
        let mut current = String::new();

        for segment in self.pathname.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            if !paths.contains(&current) {
                paths.push(current.clone());
            }
        }

        paths
    }

    /// Cookie path used when a write carries no `Path` attribute: the page path
    /// up to, but not including, its last `/`.
    pub fn default_cookie_path(&self) -> String {
        match self.pathname.rfind('/') {
            Some(0) | None => "/".to_string(),
            Some(idx) => self.pathname[..idx].to_string(),
        }
    }

    /// Whether `domain` is the hostname or one of its parent domains.
    pub fn domain_matches(&self, domain: &str) -> bool {
        let domain = domain.trim_start_matches('.').to_ascii_lowercase();
        if domain.is_empty() {
            return false;
        }
        self.hostname == domain
            || self
                .hostname
                .strip_suffix(&domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    }

    /// Whether a cookie scoped to `cookie_path` is sent for this page.
    pub fn path_matches(&self, cookie_path: &str) -> bool {
        if self.pathname == cookie_path {
            return true;
        }
        self.pathname.starts_with(cookie_path)
            && (cookie_path.ends_with('/')
                || self.pathname[cookie_path.len()..].starts_with('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a.b.com", &["a.b.com", "b.com", "com"])]
    #[case("example.com", &["example.com", "com"])]
    #[case("localhost", &["localhost"])]
    fn test_domain_candidates(#[case] host: &str, #[case] expected: &[&str]) {
        let page = PageLocation::new(host, &format!("https://{host}"), "/", true);
        let candidates = page.domain_candidates();
        assert_eq!(candidates, expected);
        assert_eq!(candidates.len(), host.split('.').count());
        for candidate in &candidates {
            assert!(host.ends_with(candidate.as_str()));
        }
    }

    #[test]
    fn test_domain_candidates_empty_host() {
        let page = PageLocation::new("", "null", "/index.html", false);
        assert!(page.domain_candidates().is_empty());
    }

    #[rstest]
    #[case("http://127.0.0.1:8080/", true)]
    #[case("http://[::1]/", true)]
    #[case("https://example.com/", false)]
    #[case("http://localhost/", false)]
    fn test_is_ip_host(#[case] url: &str, #[case] expected: bool) {
        assert_eq!(PageLocation::parse(url).unwrap().is_ip_host(), expected);
    }

    #[rstest]
    #[case("/a/b", &["/", "/a", "/a/b"])]
    #[case("/", &["/"])]
    #[case("/a//b/", &["/", "/a", "/a/b"])]
    #[case("/docs/index.html", &["/", "/docs", "/docs/index.html"])]
    fn test_path_candidates(#[case] path: &str, #[case] expected: &[&str]) {
        let page = PageLocation::new("example.com", "https://example.com", path, true);
        assert_eq!(page.path_candidates(), expected);
    }

    #[test]
    fn test_parse_url() {
        let page = PageLocation::parse("https://Sub.Example.com:8443/a/b?q=1#frag").unwrap();
        assert_eq!(page.hostname(), "sub.example.com");
        assert_eq!(page.origin(), "https://sub.example.com:8443");
        assert_eq!(page.pathname(), "/a/b");
        assert!(page.is_secure());

        let plain = PageLocation::parse("http://example.com").unwrap();
        assert!(!plain.is_secure());
        assert_eq!(plain.pathname(), "/");
    }

    #[rstest]
    #[case("/a/b", "/a")]
    #[case("/a/b/", "/a/b")]
    #[case("/a", "/")]
    #[case("/", "/")]
    fn test_default_cookie_path(#[case] path: &str, #[case] expected: &str) {
        let page = PageLocation::new("example.com", "https://example.com", path, true);
        assert_eq!(page.default_cookie_path(), expected);
    }

    #[rstest]
    #[case("a.b.com", true)]
    #[case(".b.com", true)]
    #[case("B.COM", true)]
    #[case("com", true)]
    #[case("ab.com", false)]
    #[case("other.com", false)]
    #[case("", false)]
    fn test_domain_matches(#[case] domain: &str, #[case] expected: bool) {
        let page = PageLocation::new("a.b.com", "https://a.b.com", "/", true);
        assert_eq!(page.domain_matches(domain), expected);
    }

    #[rstest]
    #[case("/", true)]
    #[case("/docs", true)]
    #[case("/docs/", true)]
    #[case("/docs/guide", true)]
    #[case("/doc", false)]
    #[case("/other", false)]
    fn test_path_matches(#[case] cookie_path: &str, #[case] expected: bool) {
        let page = PageLocation::new("example.com", "https://example.com", "/docs/guide", true);
        assert_eq!(page.path_matches(cookie_path), expected);
    }
}
