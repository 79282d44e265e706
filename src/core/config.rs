//! Engine configuration
//!
//! Settings the engine reads at construction time. Values come from a TOML
//! document (usually a section of the host's own configuration file); every
//! field has a default so an empty document is a valid configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Exit code used when an interrupt terminates the process
pub const DEFAULT_INTERRUPT_EXIT_CODE: i32 = 130;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse engine configuration: {source}")]
    Parse {
        #[from]
        source: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

impl crate::core::error_handling::ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, ConfigError::Invalid { .. } | ConfigError::Parse { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::Invalid { reason, .. } => Some(reason.as_str()),
            ConfigError::Parse { source } => Some(source.message()),
            ConfigError::Io { .. } => None,
        }
    }
}

/// Output layout for log records
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    /// Timestamp, level and message
    #[default]
    Text,
    /// `Text` plus the source location of the record
    Ext,
    /// One JSON object per record
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// flexi_logger level spec, e.g. `"info"` or `"warn,plugin_engine=debug"`
    pub level: String,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
    pub color: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            file: None,
            color: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Watch for the platform interrupt signal while the engine is running
    pub install_interrupt_watcher: bool,

    /// Terminate the process after the interrupt path has stopped the
    /// application. When false, `run()` returns and the engine goes back to idle.
    pub exit_on_interrupt: bool,

    pub interrupt_exit_code: i32,

    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            install_interrupt_watcher: true,
            exit_on_interrupt: true,
            interrupt_exit_code: DEFAULT_INTERRUPT_EXIT_CODE,
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Configuration for embedding the engine in tests or other hosts that
    /// must never lose their process to an interrupt
    pub fn without_interrupts() -> Self {
        Self {
            install_interrupt_watcher: false,
            exit_on_interrupt: false,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "logging.level".to_string(),
                reason: "log level cannot be empty".to_string(),
            });
        }
        if !(0..=255).contains(&self.interrupt_exit_code) {
            return Err(ConfigError::Invalid {
                field: "interrupt_exit_code".to_string(),
                reason: format!(
                    "exit code {} is outside the portable range 0..=255",
                    self.interrupt_exit_code
                ),
            });
        }
        Ok(())
    }
}
