//! Configuration management
//!
//! `ClientConfig` is the immutable value a dispatcher is built from. Named
//! endpoints are persisted in `config.toml` inside the config directory
//! (`$OSC_CONFIG_DIR`, or the platform config dir joined with `osc`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::alias::Alias;
use crate::error::{Error, Result};

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "OSC_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection pool sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Upper bound on simultaneously leased connections
    pub max_total: usize,
    /// Upper bound per destination (scheme, host, port)
    pub max_per_route: usize,
    /// How often idle routes are swept, and how long a route may stay idle
    pub idle_eviction_secs: u64,
}

impl PoolConfig {
    pub fn idle_eviction(&self) -> Duration {
        Duration::from_secs(self.idle_eviction_secs)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_total: 100,
            max_per_route: 20,
            idle_eviction_secs: 30,
        }
    }
}

/// Settings a dispatcher is constructed with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub pool: PoolConfig,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            pool: PoolConfig::default(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// API key, ignoring empty strings
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }

    /// Check the settings and return the parsed base URL
    pub fn validate(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid base URL '{}': {e}", self.base_url)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "unsupported URL scheme '{}' (expected http or https)",
                url.scheme()
            )));
        }
        if self.pool.max_total == 0 || self.pool.max_per_route == 0 {
            return Err(Error::Config(
                "pool limits must be greater than zero".to_string(),
            ));
        }

        Ok(url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Contents of `config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub aliases: Vec<Alias>,
}

fn default_schema_version() -> u32 {
    CONFIG_SCHEMA_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            aliases: Vec::new(),
        }
    }
}

/// Loads and saves the config file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Use the default location
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: config_dir()?.join(CONFIG_FILE_NAME),
        })
    }

    /// Use an explicit config file path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config, falling back to defaults when the file is missing
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "Config file not found, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let config: Config = toml::from_str(&content)?;

        if config.schema_version > CONFIG_SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "config schema version {} is newer than supported version {}",
                config.schema_version, CONFIG_SCHEMA_VERSION
            )));
        }

        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.path, content)?;
        tracing::debug!(path = %self.path.display(), "Saved config");
        Ok(())
    }
}

fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }

    dirs::config_dir()
        .map(|dir| dir.join("osc"))
        .ok_or_else(|| Error::Config("could not determine config directory".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.pool.max_total, 100);
        assert_eq!(config.pool.max_per_route, 20);
        assert_eq!(config.pool.idle_eviction(), Duration::from_secs(30));
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_empty_api_key_is_ignored() {
        let config = ClientConfig::default().with_api_key("");
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        assert!(ClientConfig::new("not a url").validate().is_err());
        assert!(ClientConfig::new("ftp://example.com").validate().is_err());
        assert!(ClientConfig::new("https://example.com").validate().is_ok());
    }

    #[test]
    fn test_client_config_from_toml() {
        let config: ClientConfig = toml::from_str(
            r#"
            base_url = "https://storage.example.com"
            api_key = "secret"

            [pool]
            max_total = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.api_key(), Some("secret"));
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.pool.max_total, 10);
        assert_eq!(config.pool.max_per_route, 20);
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp_dir.path().join("config.toml"));
        let config = manager.load().unwrap();
        assert!(config.aliases.is_empty());
        assert_eq!(config.schema_version, 1);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp_dir.path().join("nested/config.toml"));

        let mut config = Config::default();
        config
            .aliases
            .push(Alias::new("local", "http://localhost:8080"));
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_newer_schema() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "schema_version = 99\n").unwrap();

        let err = ConfigManager::with_path(&path).load().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
