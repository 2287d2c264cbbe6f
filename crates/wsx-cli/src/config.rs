//! Client configuration at `~/.wsx/config.toml`.
//!
//! Holds the server base URL and the API token written by `wsx login`.
//! CLI flags always override config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
}

/// Server connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Management server base URL.
    #[serde(default = "default_url")]
    pub url: String,

    /// API token written by `wsx login`. Empty = not logged in.
    #[serde(default)]
    pub token: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            token: String::new(),
        }
    }
}

fn default_url() -> String {
    "http://localhost:8080".to_string()
}

/// Default config location: `~/.wsx/config.toml`.
pub fn default_path() -> String {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".wsx")
        .join("config.toml")
        .to_string_lossy()
        .to_string()
}

impl Config {
    /// Load configuration from a TOML file, returning defaults if the file
    /// does not exist.
    pub fn load(path: &str) -> Result<Self> {
        let path = Path::new(path);
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Save the configuration to a TOML file.
    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self).context("failed to serialize config")?;

        let path = Path::new(path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("failed to write config to {}", path.display()))?;

        Ok(())
    }
}
