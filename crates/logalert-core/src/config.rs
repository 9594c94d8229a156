//! Configuration management for LogAlert

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Prefix for environment overrides, e.g. `LOGALERT__ENGINE__MAX_LOGS=200`
pub const ENV_PREFIX: &str = "LOGALERT";

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Evaluation input bounds
    pub engine: EngineConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from an optional file plus `LOGALERT__*` environment
    /// variables, layered over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the runner cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.engine.log_window_minutes == 0 {
            return Err(Error::config("engine.log_window_minutes must be greater than 0"));
        }
        if self.engine.max_logs == 0 {
            return Err(Error::config("engine.max_logs must be greater than 0"));
        }
        if self.engine.alert_history_hours == 0 {
            return Err(Error::config("engine.alert_history_hours must be greater than 0"));
        }
        match self.logging.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(Error::config(format!(
                "logging.format must be \"pretty\" or \"json\", got \"{other}\""
            ))),
        }
    }
}

/// Bounds applied to the inputs of a single evaluation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How far back the log source looks, in minutes
    pub log_window_minutes: u32,
    /// Maximum number of log entries handed to the engine
    pub max_logs: usize,
    /// How much alert history is loaded for cooldown checks, in hours
    pub alert_history_hours: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_window_minutes: 30,
            max_logs: 500,
            alert_history_hours: 24,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.log_window_minutes, 30);
        assert_eq!(config.engine.max_logs, 500);
        assert_eq!(config.engine.alert_history_hours, 24);
    }

    #[test]
    fn test_load_from_file_keeps_unset_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[engine]\nmax_logs = 50\n\n[logging]\nformat = \"json\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();

        assert_eq!(config.engine.max_logs, 50);
        assert_eq!(config.engine.log_window_minutes, 30);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.engine.max_logs = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
