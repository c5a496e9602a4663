//! Alias management
//!
//! An alias is a named storage service endpoint: base URL, optional API key
//! and request timeout. Aliases live in the config file.

use serde::{Deserialize, Serialize};

use crate::config::{ClientConfig, ConfigManager, DEFAULT_TIMEOUT_SECS};
use crate::error::{Error, Result};

/// A named storage service endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Alias {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Build the client settings for this endpoint
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(&self.base_url).with_timeout_secs(self.timeout_secs);
        config.api_key = self.api_key.clone();
        config
    }

    pub fn validate(&self) -> Result<()> {
        validate_alias_name(&self.name)?;
        self.client_config().validate()?;
        Ok(())
    }
}

fn validate_alias_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Config("alias name cannot be empty".to_string()));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::Config(format!(
            "invalid alias name '{name}': use letters, digits, '-' or '_'"
        )));
    }
    Ok(())
}

/// CRUD over the aliases stored in the config file
#[derive(Debug, Clone)]
pub struct AliasManager {
    config_manager: ConfigManager,
}

impl AliasManager {
    pub fn new() -> Result<Self> {
        Ok(Self {
            config_manager: ConfigManager::new()?,
        })
    }

    pub fn with_config_manager(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    pub fn list(&self) -> Result<Vec<Alias>> {
        let mut aliases = self.config_manager.load()?.aliases;
        aliases.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(aliases)
    }

    pub fn get(&self, name: &str) -> Result<Alias> {
        self.config_manager
            .load()?
            .aliases
            .into_iter()
            .find(|alias| alias.name == name)
            .ok_or_else(|| Error::AliasNotFound(name.to_string()))
    }

    /// Add an alias or replace the one with the same name
    pub fn set(&self, alias: Alias) -> Result<()> {
        alias.validate()?;

        let mut config = self.config_manager.load()?;
        match config.aliases.iter_mut().find(|a| a.name == alias.name) {
            Some(existing) => *existing = alias,
            None => config.aliases.push(alias),
        }
        self.config_manager.save(&config)
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let mut config = self.config_manager.load()?;
        let before = config.aliases.len();
        config.aliases.retain(|alias| alias.name != name);

        if config.aliases.len() == before {
            return Err(Error::AliasNotFound(name.to_string()));
        }
        self.config_manager.save(&config)
    }
}
