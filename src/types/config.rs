//! Configuration for goldfile.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::GoldfileResult;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "goldfile.toml";

/// Main configuration for goldfile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Regression cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Instrumentation hook settings.
    #[serde(default)]
    pub hooks: HooksConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Regression cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Decimal places two values must agree to.
    #[serde(default = "default_decimal")]
    pub decimal: u32,

    /// fsync slot files before renaming them into place.
    #[serde(default = "default_true")]
    pub sync: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            decimal: default_decimal(),
            sync: true,
        }
    }
}

fn default_decimal() -> u32 {
    7
}

fn default_true() -> bool {
    true
}

/// Instrumentation hook settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HooksConfig {
    /// Emit a tracing event for every check.
    #[serde(default = "default_true")]
    pub logging: bool,

    /// Collect check counters and print them at exit.
    #[serde(default)]
    pub metrics: bool,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            logging: true,
            metrics: false,
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> GoldfileResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> GoldfileResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            cache: CacheConfig::default(),
            hooks: HooksConfig::default(),
        }
    }

    /// Loads configuration from `path`, or uses default when the file is absent.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> GoldfileResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default_config())
        }
    }

    /// Checks values serde cannot constrain.
    pub fn validate(&self) -> GoldfileResult<()> {
        crate::cache::Tolerance::from_decimal(self.cache.decimal)?;

        match self.general.log_format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(crate::GoldfileError::config(format!(
                "unknown log_format '{}' (expected text or json)",
                other
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
