//! Application configuration management.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Calculation engine configuration.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Batch runner configuration.
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Calculation engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// How many times a rollup reloads and retries after a version conflict.
    #[serde(default = "default_rollup_max_retries")]
    pub rollup_max_retries: u32,
    /// Period granularity used when a distribution request does not name one.
    #[serde(default = "default_granularity")]
    pub default_granularity: String,
    /// Allowed gap between a manual distribution and its total, in minor units.
    #[serde(default = "default_manual_tolerance_units")]
    pub manual_tolerance_units: u32,
}

fn default_rollup_max_retries() -> u32 {
    1
}

fn default_granularity() -> String {
    "monthly".to_string()
}

fn default_manual_tolerance_units() -> u32 {
    1
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rollup_max_retries: default_rollup_max_retries(),
            default_granularity: default_granularity(),
            manual_tolerance_units: default_manual_tolerance_units(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "meridian=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

/// Batch runner configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunnerConfig {
    /// Project fixture to load.
    pub input_path: Option<PathBuf>,
    /// Data date to roll up to; defaults to the fixture's own data date.
    pub data_date: Option<NaiveDate>,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("MERIDIAN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_sources() {
        temp_env::with_vars(
            [
                ("RUN_MODE", Some("nonexistent-mode")),
                ("MERIDIAN__ENGINE__ROLLUP_MAX_RETRIES", None),
                ("MERIDIAN__LOGGING__JSON", None),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.engine.rollup_max_retries, 1);
                assert_eq!(config.engine.default_granularity, "monthly");
                assert_eq!(config.engine.manual_tolerance_units, 1);
                assert_eq!(config.logging.filter, "meridian=info");
                assert!(!config.logging.json);
                assert!(config.runner.input_path.is_none());
            },
        );
    }

    #[test]
    fn test_environment_overrides() {
        temp_env::with_vars(
            [
                ("RUN_MODE", Some("nonexistent-mode")),
                ("MERIDIAN__ENGINE__ROLLUP_MAX_RETRIES", Some("3")),
                ("MERIDIAN__LOGGING__JSON", Some("true")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.engine.rollup_max_retries, 3);
                assert!(config.logging.json);
            },
        );
    }
}
