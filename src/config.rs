//! Runtime configuration from environment variables
//!
//!   CATALOG_API_URL       base URL of the catalog REST API
//!   PORT                  port the web service listens on
//!   DATA_DIR              directory of the project file store
//!   CACHE_TTL_SECS        lifetime of cached upstream searches
//!   CACHE_CAPACITY        maximum number of cached searches
//!   REQUEST_TIMEOUT_SECS  upstream request timeout

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub cache_ttl: Duration,
    pub cache_capacity: u64,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            port: 3000,
            data_dir: PathBuf::from("data"),
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 1_000,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source; unset or unparsable values keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            api_url: lookup("CATALOG_API_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.api_url),
            port: lookup("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            data_dir: lookup("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            cache_ttl: parsed("CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            cache_capacity: parsed("CACHE_CAPACITY").unwrap_or(defaults.cache_capacity),
            request_timeout: parsed("REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("Configuration:");
        tracing::info!("  CATALOG_API_URL: {}", self.api_url);
        tracing::info!("  PORT: {}", self.port);
        tracing::info!("  DATA_DIR: {}", self.data_dir.display());
        tracing::info!("  CACHE_TTL_SECS: {}", self.cache_ttl.as_secs());
        tracing::info!("  CACHE_CAPACITY: {}", self.cache_capacity);
        tracing::info!("  REQUEST_TIMEOUT_SECS: {}", self.request_timeout.as_secs());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(Config::from_lookup(|_| None), Config::default());
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let vars: HashMap<&str, &str> = [
            ("CATALOG_API_URL", "https://plants.example.org"),
            ("PORT", "not-a-port"),
            ("DATA_DIR", "/var/lib/plants"),
            ("CACHE_TTL_SECS", "60"),
            ("REQUEST_TIMEOUT_SECS", " 3 "),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_url, "https://plants.example.org");
        assert_eq!(config.port, 3000);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/plants"));
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.cache_capacity, 1_000);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }
}
