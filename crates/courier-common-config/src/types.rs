//! Configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    /// Base URL that request targets are resolved against.
    pub base_url: Option<String>,
    /// Settings for the bundled HTTP client.
    pub http: HttpSettings,
}

/// Settings forwarded to the HTTP client builder.
///
/// Courier itself enforces none of these; they configure the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// User agent string.
    pub user_agent: String,
    /// Maximum idle connections kept per host.
    pub pool_max_idle_per_host: usize,
    /// Enable gzip decompression.
    pub gzip: bool,
    /// Report non-2xx responses as client failures.
    pub error_for_status: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            user_agent: format!("courier/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 10,
            gzip: true,
            error_for_status: true,
        }
    }
}

impl HttpSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CourierConfig::default();
        assert!(config.base_url.is_none());
        assert_eq!(config.http.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.http.request_timeout(), Duration::from_secs(30));
        assert!(config.http.user_agent.starts_with("courier/"));
        assert_eq!(config.http.pool_max_idle_per_host, 10);
        assert!(config.http.gzip);
        assert!(config.http.error_for_status);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "http:\n  request_timeout_secs: 5\n";
        let config: CourierConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.http.request_timeout_secs, 5);
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert!(config.http.gzip);
    }

    #[test]
    fn test_serializes_sections() {
        let yaml = serde_yaml::to_string(&CourierConfig::default()).unwrap();
        assert!(yaml.contains("base_url:"));
        assert!(yaml.contains("http:"));
        assert!(yaml.contains("error_for_status: true"));
    }
}
