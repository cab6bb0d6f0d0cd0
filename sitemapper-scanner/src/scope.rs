use crate::error::{Result, ScanError};
use std::fmt;
use url::Url;

/// The URL a crawl starts from. Parsing it is the only fatal check a crawl makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUrl {
    url: Url,
    origin: Origin,
}

impl SeedUrl {
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: String| ScanError::InvalidSeed {
            url: input.to_string(),
            reason,
        };

        let url = Url::parse(input.trim()).map_err(|e| invalid(e.to_string()))?;

        if !is_crawlable_scheme(url.scheme()) {
            return Err(invalid(format!(
                "scheme '{}' is not http or https",
                url.scheme()
            )));
        }

        let origin = Origin::of(&url).ok_or_else(|| invalid("missing host".to_string()))?;

        Ok(Self {
            url: strip_fragment(url),
            origin,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for SeedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Host and explicit port of the seed. Scheme and userinfo are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    host: String,
    port: Option<u16>,
}

impl Origin {
    pub fn of(url: &Url) -> Option<Self> {
        let host = url.host_str().filter(|h| !h.is_empty())?;
        Some(Self {
            host: host.to_string(),
            port: url.port(),
        })
    }

    pub fn contains(&self, url: &Url) -> bool {
        url.host_str() == Some(self.host.as_str()) && url.port() == self.port
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => f.write_str(&self.host),
        }
    }
}

pub(crate) fn is_crawlable_scheme(scheme: &str) -> bool {
    scheme == "http" || scheme == "https"
}

/// Drops the fragment, the only normalization applied on top of URL parsing.
pub fn strip_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_with_path_and_fragment() {
        let seed = SeedUrl::parse("https://example.com/docs#intro").unwrap();
        assert_eq!(seed.as_str(), "https://example.com/docs");
        assert_eq!(seed.origin().to_string(), "example.com");
    }

    #[test]
    fn test_seed_gets_root_path() {
        let seed = SeedUrl::parse("https://example.com").unwrap();
        assert_eq!(seed.as_str(), "https://example.com/");
    }

    #[test]
    fn test_seed_without_scheme_is_rejected() {
        let err = SeedUrl::parse("example.com").unwrap_err();
        assert!(matches!(err, ScanError::InvalidSeed { .. }));
    }

    #[test]
    fn test_seed_without_host_is_rejected() {
        assert!(SeedUrl::parse("mailto:someone@example.com").is_err());
        assert!(SeedUrl::parse("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_seed_garbage_is_rejected() {
        let err = SeedUrl::parse("not a url").unwrap_err();
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn test_origin_keeps_explicit_port() {
        let seed = SeedUrl::parse("http://localhost:8080/").unwrap();
        assert_eq!(seed.origin().to_string(), "localhost:8080");

        let same = Url::parse("http://localhost:8080/about").unwrap();
        let other_port = Url::parse("http://localhost:9090/about").unwrap();
        assert!(seed.origin().contains(&same));
        assert!(!seed.origin().contains(&other_port));
    }

    #[test]
    fn test_origin_ignores_scheme() {
        let seed = SeedUrl::parse("https://example.com/").unwrap();
        let plain = Url::parse("http://example.com/about").unwrap();
        assert!(seed.origin().contains(&plain));
    }

    #[test]
    fn test_origin_rejects_subdomain() {
        let seed = SeedUrl::parse("https://example.com/").unwrap();
        let sub = Url::parse("https://blog.example.com/").unwrap();
        assert!(!seed.origin().contains(&sub));
    }

    #[test]
    fn test_default_port_matches_implicit() {
        let seed = SeedUrl::parse("https://example.com:443/").unwrap();
        let url = Url::parse("https://example.com/about").unwrap();
        assert!(seed.origin().contains(&url));
    }
}
