use std::fmt;
use url::Url;

use crate::Result;
use crate::ratelimit::RateLimitError;

/// A type-safe representation of a destination for rate limiting purposes.
///
/// This extracts and normalizes the host from URLs to ensure consistent
/// rate limiting across requests to the same host (domain or IP address).
/// An explicit, non-default port is part of the key, so two servers on the
/// same machine are limited independently.
///
/// # Examples
///
/// ```
/// use hostlimit_lib::HostKey;
/// use url::Url;
///
/// let url = Url::parse("https://api.github.com/repos/user/repo").unwrap();
/// let host_key = HostKey::try_from(&url).unwrap();
/// assert_eq!(host_key.as_str(), "api.github.com");
///
/// let url = Url::parse("http://127.0.0.1:8080/health").unwrap();
/// let host_key = HostKey::try_from(&url).unwrap();
/// assert_eq!(host_key.as_str(), "127.0.0.1:8080");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostKey(String);

impl HostKey {
    /// Get the hostname as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the hostname as an owned String
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<&Url> for HostKey {
    type Error = RateLimitError;

    fn try_from(url: &Url) -> Result<Self> {
        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| RateLimitError::InvalidRequest { url: url.clone() })?;

        // `Url::port` is `None` for the scheme's default port
        let key = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        // Normalize to lowercase for consistent lookup
        Ok(HostKey(key.to_lowercase()))
    }
}

impl TryFrom<Url> for HostKey {
    type Error = RateLimitError;

    fn try_from(url: Url) -> Result<Self> {
        HostKey::try_from(&url)
    }
}

impl fmt::Display for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for HostKey {
    fn from(host: String) -> Self {
        HostKey(host.to_lowercase())
    }
}

impl From<&str> for HostKey {
    fn from(host: &str) -> Self {
        HostKey(host.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_host_key_from_url() {
        let url = Url::parse("https://api.github.com/repos/user/repo").unwrap();
        let host_key = HostKey::try_from(&url).unwrap();
        assert_eq!(host_key.as_str(), "api.github.com");
    }

    #[test]
    fn test_host_key_normalization() {
        let url = Url::parse("https://API.GITHUB.COM/repos/user/repo").unwrap();
        let host_key = HostKey::try_from(&url).unwrap();
        assert_eq!(host_key.as_str(), "api.github.com");
    }

    #[rstest]
    #[case("https://example.com/", "example.com")]
    #[case("https://example.com:443/", "example.com")]
    #[case("http://example.com:80/a", "example.com")]
    #[case("https://example.com:8443/", "example.com:8443")]
    #[case("http://127.0.0.1:3000/", "127.0.0.1:3000")]
    #[case("http://[::1]:3000/", "[::1]:3000")]
    fn test_host_key_port_handling(#[case] input: &str, #[case] expected: &str) {
        let url = Url::parse(input).unwrap();
        assert_eq!(HostKey::try_from(&url).unwrap().as_str(), expected);
    }

    #[test]
    fn test_host_key_subdomain_separation() {
        let api_key = HostKey::try_from(Url::parse("https://api.github.com/").unwrap()).unwrap();
        let www_key = HostKey::try_from(Url::parse("https://www.github.com/").unwrap()).unwrap();

        assert_ne!(api_key, www_key);
    }

    #[rstest]
    #[case("file:///path/to/file")]
    #[case("data:text/plain,hello")]
    #[case("mailto:someone@example.com")]
    fn test_host_key_no_host(#[case] input: &str) {
        let url = Url::parse(input).unwrap();
        let result = HostKey::try_from(&url);
        assert!(matches!(
            result,
            Err(RateLimitError::InvalidRequest { url: ref bad }) if *bad == url
        ));
    }

    #[test]
    fn test_host_key_display() {
        let host_key = HostKey::from("Example.com");
        assert_eq!(format!("{host_key}"), "example.com");
    }

    #[test]
    fn test_host_key_hash_equality() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(HostKey::from("example.com"), "value");

        assert_eq!(map.get(&HostKey::from("EXAMPLE.COM")), Some(&"value"));
    }
}
