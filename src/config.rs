//! TOML configuration for the query binary.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::shortcode::GridOffsetEncoder;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub server: ServerConfig,
    pub shortcode: ShortCodeConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
    /// Abort the load on the first invalid entry instead of skipping it
    pub strict: bool,
    /// Put an R-tree in front of the catalog
    pub index: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            strict: false,
            index: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ShortCodeConfig {
    /// Grid cell size in degrees
    pub precision: f64,
}

impl Default for ShortCodeConfig {
    fn default() -> Self {
        Self {
            precision: GridOffsetEncoder::DEFAULT_PRECISION,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
