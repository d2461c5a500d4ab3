//! Configuration management for sqlruner
//!
//! This module handles loading, validating, and saving the JSON configuration:
//! where the history database lives, how history is paged, and how result
//! grids are rendered.

use crate::error::{Error, Result};
use crate::pager::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Default maximum width of a rendered result column
pub const DEFAULT_MAX_COLUMN_WIDTH: usize = 40;

/// Default text shown for NULL cells
pub const DEFAULT_NULL_PLACEHOLDER: &str = "NULL";

/// Main configuration structure for sqlruner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the history database
    pub history_file: PathBuf,

    /// Number of history records per page
    pub page_size: usize,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Result grid rendering
    pub display: DisplayConfig,
}

/// Configuration for logging
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

/// Configuration for printing result sets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Cells wider than this are truncated with an ellipsis
    pub max_column_width: usize,

    /// Text printed for NULL values
    pub null_placeholder: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_file: crate::default_history_path()
                .unwrap_or_else(|_| std::env::temp_dir().join(crate::APP_DIR).join(crate::HISTORY_FILE)),
            page_size: DEFAULT_PAGE_SIZE,
            logging: LoggingConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
            null_placeholder: DEFAULT_NULL_PLACEHOLDER.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or(Error::DataDirectoryNotFound)?;
        Ok(dir.join(crate::APP_DIR).join(DEFAULT_CONFIG_FILE))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.history_file.as_os_str().is_empty() {
            return Err(Error::config_validation("history_file", "must not be empty"));
        }

        if self.page_size == 0 {
            return Err(Error::config_validation(
                "page_size",
                "must be greater than 0",
            ));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(Error::config_validation(
                    "logging.level",
                    "must be one of: trace, debug, info, warn, error",
                ));
            }
        }

        if self.display.max_column_width < 4 {
            return Err(Error::config_validation(
                "display.max_column_width",
                "must be at least 4",
            ));
        }

        Ok(())
    }
}
