//! Configuration file support
//!
//! Loads `BorderOptions` from a TOML file with a `[border]` table and merges
//! command-line overrides on top. CLI values always take precedence.
//!
//! # Search order
//!
//! 1. `./superbook-border.toml`
//! 2. `<config_dir>/superbook-border/config.toml`
//!
//! # Example
//!
//! ```toml
//! threads = 4
//!
//! [border]
//! strategy = "center-out"
//! edge_process_pct = 0.2
//! first_wins = false
//!
//! [border.colors]
//! top = [250, 250, 250]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::border::{BorderOptions, DetectionStrategy, SideColors};

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "superbook-border.toml";

/// Directory under the user config dir
pub const CONFIG_DIR_NAME: &str = "superbook-border";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// File configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Border detection and whitening options
    pub border: BorderOptions,
    /// Worker threads for batch processing (all cores when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub strategy: Option<DetectionStrategy>,
    pub first_wins: Option<bool>,
    pub diagnostic_colors: bool,
    pub edge_process_pct: Option<f32>,
    pub dark_threshold: Option<f32>,
    pub threads: Option<usize>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Config {
    /// Load from the first config file found, or defaults when there is none
    pub fn load() -> Result<Self, ConfigError> {
        for path in Self::search_paths() {
            if path.is_file() {
                return Self::load_from_path(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load from an explicit path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Parse and validate TOML text
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config
            .border
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if config.threads == Some(0) {
            return Err(ConfigError::Invalid("threads must be positive".to_string()));
        }
        Ok(config)
    }

    /// Config file locations, in lookup order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join(CONFIG_DIR_NAME).join("config.toml"));
        }
        paths
    }

    /// Apply CLI overrides (CLI takes precedence)
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> Config {
        let mut merged = self.clone();
        let border = &mut merged.border;

        if let Some(strategy) = cli.strategy {
            border.strategy = strategy;
        }
        if let Some(first_wins) = cli.first_wins {
            border.first_wins = first_wins;
        }
        if cli.diagnostic_colors {
            border.colors = SideColors::diagnostic();
        }
        if let Some(pct) = cli.edge_process_pct {
            border.edge_process_pct = pct.clamp(0.0, 0.5);
        }
        if let Some(dark) = cli.dark_threshold {
            border.dark_threshold = dark.clamp(0.0, 255.0);
        }
        if cli.threads.is_some() {
            merged.threads = cli.threads;
        }

        merged
    }

    /// Serialize as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
