//! Configuration management for cssense
//!
//! Configuration comes from a TOML file (default `~/.cssense/config.toml`)
//! and command-line flags. Precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfigError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Completion configuration
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Completion engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionConfig {
    /// Maximum number of candidates per completion
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// JSON property table (`{ "property": ["value", ...] }`); built-in table if unset
    #[serde(default)]
    pub properties_file: Option<PathBuf>,

    /// JSON selector index; selector completion is off if unset
    #[serde(default)]
    pub selectors_file: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_max_entries() -> usize {
    15
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            properties_file: None,
            selectors_file: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.display().to_string()).into()
            } else {
                crate::error::CssenseError::from(e)
            }
        })?;
        let config: Config = toml::from_str(&content)?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load configuration, falling back to defaults when no file exists
    ///
    /// # Arguments
    /// * `path` - Explicit config path; the default path is used when `None`
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::default_config_path();
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    debug!(path = %path.display(), "no config file, using defaults");
                    Self::default()
                }
            }
        };
        debug!(max_entries = config.completion.max_entries, "effective completion settings");
        Ok(config)
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cssense")
            .join("config.toml")
    }

    /// Save configuration to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.completion.max_entries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "completion.max_entries".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CssenseError;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("cssense-config-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.completion.max_entries, 15);
        assert!(config.completion.properties_file.is_none());
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert!(config.logging.timestamps);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[completion]\nmax_entries = 5\n").unwrap();
        assert_eq!(config.completion.max_entries, 5);
        assert_eq!(config.logging, LoggingConfig::default());

        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_log_level_parsing() {
        let config: Config = toml::from_str("[logging]\nlevel = \"trace\"\ntimestamps = false\n").unwrap();
        assert_eq!(config.logging.level.to_tracing_level(), tracing::Level::TRACE);
        assert!(!config.logging.timestamps);
    }

    #[test]
    fn test_validate_rejects_zero_entries() {
        let mut config = Config::default();
        config.completion.max_entries = 0;
        assert!(matches!(
            config.validate(),
            Err(CssenseError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = Config::from_file(temp_path("does-not-exist.toml")).unwrap_err();
        assert!(matches!(err, CssenseError::Config(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("saved.toml");
        let mut config = Config::default();
        config.completion.max_entries = 7;
        config.completion.selectors_file = Some(PathBuf::from("dom.json"));
        config.save(&path).unwrap();

        let loaded = Config::load_from_file(Some(&path)).unwrap();
        assert_eq!(loaded, config);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.ends_with(".cssense/config.toml"));
    }
}
