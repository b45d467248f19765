//! Client configuration.
//!
//! Defaults target the production reality management endpoint. Values can be
//! overridden from the environment, a TOML file, or the `with_*` setters.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.bentley.com/reality-management/reality-data";
const DEFAULT_ACCEPT: &str = "application/vnd.bentley.itwin-platform.v1+json";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_PAGE_SIZE: u32 = 100;
const MAX_PAGE_SIZE: u32 = 500;

/// Configuration for `RealityDataClient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ClientConfig {
    /// Reality data endpoint, without trailing slash.
    pub base_url: String,
    /// Versioned media type sent in the `Accept` header.
    pub accept: String,
    pub request_timeout_ms: u64,
    /// Default `$top` for list queries.
    pub page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create ClientConfig from environment variables.
    ///
    /// Environment variables:
    /// - `REALITY_DATA_BASE_URL`: endpoint (default: production endpoint)
    /// - `REALITY_DATA_ACCEPT`: media type for the `Accept` header
    /// - `REALITY_DATA_TIMEOUT_MS`: request timeout (default: 30000)
    /// - `REALITY_DATA_PAGE_SIZE`: default list page size (default: 100)
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = std::env::var("REALITY_DATA_BASE_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.base_url);

        let accept = std::env::var("REALITY_DATA_ACCEPT")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.accept);

        let request_timeout_ms = std::env::var("REALITY_DATA_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.request_timeout_ms);

        let page_size = std::env::var("REALITY_DATA_PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.page_size);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            accept,
            request_timeout_ms,
            page_size,
        }
    }

    /// Load and validate a TOML config file. Missing keys take defaults.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut config: ClientConfig = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = accept.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "base_url".to_string(),
            });
        }
        if let Err(e) = url::Url::parse(&self.base_url) {
            return Err(ConfigError::InvalidValue {
                field: "base_url".to_string(),
                value: self.base_url.clone(),
                reason: e.to_string(),
            });
        }
        if self.accept.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "accept".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms".to_string(),
                value: self.request_timeout_ms.to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "page_size".to_string(),
                value: self.page_size.to_string(),
                reason: format!("must be in 1..={}", MAX_PAGE_SIZE),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = ClientConfig::new().with_base_url("https://example.test/reality-data/");
        assert_eq!(config.base_url, "https://example.test/reality-data");
    }

    #[test]
    fn test_freshness_window_is_not_configurable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "freshness_window_secs = 3599").unwrap();
        assert!(matches!(
            ClientConfig::from_path(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_page_size_bounds() {
        assert!(ClientConfig::new().with_page_size(0).validate().is_err());
        assert!(ClientConfig::new().with_page_size(501).validate().is_err());
        assert!(ClientConfig::new().with_page_size(500).validate().is_ok());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = ClientConfig::new().with_base_url("not a url");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_path_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = \"http://localhost:8080/reality-data/\"").unwrap();
        writeln!(file, "page_size = 25").unwrap();

        let config = ClientConfig::from_path(file.path()).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/reality-data");
        assert_eq!(config.page_size, 25);
        assert_eq!(config.request_timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_from_path_rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "colour = \"blue\"").unwrap();
        assert!(matches!(
            ClientConfig::from_path(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = ClientConfig::from_path(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
