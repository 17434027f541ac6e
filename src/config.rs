// src/config.rs
//! Configuration for repository loading
//!
//! Supports TOML configuration files with the following sections:
//! - [http] - Request timeout and user agent
//! - [load] - Which streams to fetch and whether to verify them
//!
//! Every field has a default, so an empty file is a valid configuration.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Loading behaviour
    #[serde(default)]
    pub load: LoadOptions,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            return Err(Error::Config("http.timeout_secs must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// HTTP transport configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("repomd/{}", env!("CARGO_PKG_VERSION"))
}

fn default_true() -> bool {
    true
}

/// Options controlling what a load fetches
#[derive(Debug, Clone, Deserialize)]
pub struct LoadOptions {
    /// Also fetch the filelists stream and attach file paths to packages
    #[serde(default)]
    pub filelists: bool,

    /// Verify stream checksums listed in repomd.xml
    #[serde(default = "default_true")]
    pub verify_checksums: bool,

    /// Treat the base location as a mirror list when repomd.xml is not found
    #[serde(default = "default_true")]
    pub mirror_fallback: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            filelists: false,
            verify_checksums: true,
            mirror_fallback: true,
        }
    }
}
