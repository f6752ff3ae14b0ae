//! Configuration loading and parsing

use anyhow::{Context, Result};
use can_translator::TranslatorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub translator: TranslatorConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    /// TOML signal table
    pub table: Option<PathBuf>,
    #[serde(default)]
    pub dbc_files: Vec<PathBuf>,
    /// Bus the DBC signals are assigned to
    #[serde(default)]
    pub dbc_bus: usize,
    /// Default speed of the bus created when only DBC files are given
    #[serde(default = "default_bus_speed")]
    pub bus_speed: u32,
}

fn default_bus_speed() -> u32 {
    500_000
}

impl AppConfig {
    /// Whether any signal source is configured
    pub fn has_signal_source(&self) -> bool {
        self.input.table.is_some() || !self.input.dbc_files.is_empty()
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
