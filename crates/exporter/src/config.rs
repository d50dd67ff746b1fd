//! Exporter configuration

use anyhow::{Context, Result};
use exporter_lib::HttpSettings;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime settings read from `EXPORTER_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ExporterConfig {
    /// JSON catalog mapping target ids to connection parameters
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Timeout for each outbound request in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,

    #[serde(default = "default_pool_idle_timeout")]
    pub pool_idle_timeout_secs: u64,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("/etc/container-exporter/targets.json")
}

fn default_request_timeout() -> u64 {
    10
}

fn default_pool_max_idle_per_host() -> usize {
    16
}

fn default_pool_idle_timeout() -> u64 {
    90
}

impl ExporterConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        Self::from_env(config::Environment::with_prefix("EXPORTER"))
    }

    fn from_env(env: config::Environment) -> Result<Self> {
        let config = config::Config::builder().add_source(env).build()?;
        config
            .try_deserialize()
            .context("Invalid EXPORTER_* configuration")
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            pool_max_idle_per_host: self.pool_max_idle_per_host,
            pool_idle_timeout: Duration::from_secs(self.pool_idle_timeout_secs),
        }
    }
}

/// Expand a `:port` listen address to all interfaces
pub fn listen_address(raw: &str) -> String {
    if raw.starts_with(':') {
        format!("0.0.0.0{raw}")
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let mut map = config::Map::new();
        for (k, v) in vars {
            map.insert(k.to_string(), v.to_string());
        }
        config::Environment::with_prefix("EXPORTER").source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let config = ExporterConfig::from_env(env(&[])).unwrap();

        assert_eq!(
            config.catalog_path,
            PathBuf::from("/etc/container-exporter/targets.json")
        );
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.pool_max_idle_per_host, 16);
        assert_eq!(config.pool_idle_timeout_secs, 90);
    }

    #[test]
    fn test_environment_overrides() {
        let config = ExporterConfig::from_env(env(&[
            ("EXPORTER_CATALOG_PATH", "/tmp/targets.json"),
            ("EXPORTER_REQUEST_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.catalog_path, PathBuf::from("/tmp/targets.json"));
        assert_eq!(
            config.http_settings().request_timeout,
            Duration::from_secs(3)
        );
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let result = ExporterConfig::from_env(env(&[("EXPORTER_REQUEST_TIMEOUT_SECS", "soon")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_listen_address() {
        assert_eq!(listen_address(":9109"), "0.0.0.0:9109");
        assert_eq!(listen_address("127.0.0.1:9000"), "127.0.0.1:9000");
    }
}
