//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the tide-config.toml file.
//! It covers the HTTP listener, the NOAA client and where the location catalog comes from.
//!
//! The fixed NOAA request parameters (datum, units, hilo interval, local time) are not
//! configurable; they live in [`crate::tide_data`].

use crate::locations::{CatalogError, LocationCatalog};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "tide-config.toml";

/// Application configuration loaded from tide-config.toml
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener configuration
    pub server: ServerConfig,
    /// NOAA CO-OPS client configuration
    pub noaa: NoaaConfig,
    /// Location catalog source
    pub catalog: CatalogConfig,
}

/// HTTP listener configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. "127.0.0.1:5000"
    pub bind: String,
}

/// NOAA CO-OPS data API configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct NoaaConfig {
    /// Data getter endpoint
    pub base_url: String,
    /// Application name NOAA asks clients to identify with
    pub application: String,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
}

/// Where location records come from
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// TOML catalog file; the built-in table is used when unset
    pub path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

impl Default for NoaaConfig {
    fn default() -> Self {
        NoaaConfig {
            base_url: "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter".to_string(),
            application: "tide_finder".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from tide-config.toml file
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "invalid config file, using defaults"
                    );
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Build the location catalog this configuration points at.
    pub fn location_catalog(&self) -> Result<LocationCatalog, CatalogError> {
        match &self.catalog.path {
            Some(path) => {
                let catalog = LocationCatalog::load_from_path(path)?;
                info!(path = %path.display(), locations = catalog.len(), "loaded location catalog");
                Ok(catalog)
            }
            None => Ok(LocationCatalog::builtin()),
        }
    }
}
