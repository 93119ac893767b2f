use std::time::Duration;

/// Environment variable selecting the API origin.
///
/// This is the only externally documented configuration surface of the
/// client core; everything else is constructed programmatically.
pub const BASE_URL_ENV: &str = "CASEKIT_API_BASE_URL";

/// Default User-Agent string for HTTP requests.
pub const DEFAULT_USER_AGENT: &str = concat!("casekit/", env!("CARGO_PKG_VERSION"));

/// Default API origin used when [`BASE_URL_ENV`] is not set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Configuration for [`crate::HttpClient`].
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL all request paths are joined onto, e.g.
    /// `https://api.example.com/api/v1`.
    pub base_url: String,

    /// Per-request timeout (default: 30s).
    pub timeout: Duration,

    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpClientConfig {
    /// Create a configuration for the given API origin.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Create a configuration from the environment, falling back to
    /// [`DEFAULT_BASE_URL`] when [`BASE_URL_ENV`] is unset or empty.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the User-Agent header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_local_api() {
        let config = HttpClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn builder_overrides_apply() {
        let config = HttpClientConfig::new("https://api.example.com/api/v1")
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("test/1.0");
        assert_eq!(config.base_url, "https://api.example.com/api/v1");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "test/1.0");
    }
}
