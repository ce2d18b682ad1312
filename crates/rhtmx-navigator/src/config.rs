// File: src/config.rs
// Purpose: Navigator configuration parsing from rhtmx-nav.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Navigator configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NavigatorConfig {
    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub navigation: NavigationConfig,
}

/// URL validator limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationConfig {
    /// Longest accepted path or query string, in characters (default: 2048)
    #[serde(default = "default_max_path_length")]
    pub max_path_length: usize,

    /// Longest accepted parameter value, in characters (default: 512)
    #[serde(default = "default_max_parameter_length")]
    pub max_parameter_length: usize,
}

/// Navigation driver settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NavigationConfig {
    /// Upper bound for one navigation, middleware included (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Redirects followed before giving up (default: 5)
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Treat a match with leftover segments as not found
    #[serde(default = "default_false")]
    pub require_exact_match: bool,

    /// Prefix stripped from every navigation target (e.g., "/app")
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

// Default values
fn default_max_path_length() -> usize {
    crate::path::validate::MAX_PATH_LENGTH
}

fn default_max_parameter_length() -> usize {
    crate::path::validate::MAX_PARAMETER_LENGTH
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

fn default_base_path() -> String {
    "/".to_string()
}

fn default_false() -> bool {
    false
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_path_length: default_max_path_length(),
            max_parameter_length: default_max_parameter_length(),
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_redirects: default_max_redirects(),
            require_exact_match: false,
            base_path: default_base_path(),
        }
    }
}

impl NavigationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl NavigatorConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist or is empty, return default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read navigator config: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: NavigatorConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse navigator config: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./rhtmx-nav.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("rhtmx-nav.toml")
    }
}
