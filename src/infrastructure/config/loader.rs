use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::adapters::proposers::ProposerType;
use crate::domain::models::config::Config;

/// Project-local configuration directory.
pub const CONFIG_DIR: &str = ".fixloop";

const ENV_PREFIX: &str = "FIXLOOP_";

/// Configuration error types
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Test command cannot be empty")]
    EmptyTestCommand,

    #[error("Model name cannot be empty")]
    EmptyModel,

    #[error("Invalid max_output_tokens: {0}. Must be at least 1")]
    InvalidMaxOutputTokens(u32),

    #[error("Invalid temperature: {0}. Must be between 0.0 and 1.0")]
    InvalidTemperature(f32),

    #[error("Invalid test_timeout_secs: {0}. Must be at least 1")]
    InvalidTestTimeout(u64),

    #[error("Invalid max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),

    #[error("Invalid {0}: {1}. Must be a finite, non-negative amount")]
    InvalidLimit(&'static str, f64),

    #[error(
        "Invalid budget: per_operation_limit_usd ({0}) must not exceed daily_limit_usd ({1})"
    )]
    PerOperationAboveDaily(f64, f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Unknown proposer provider: {0}. Must be one of: anthropic, mock")]
    UnknownProvider(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .fixloop/config.yaml (project config, created by init)
    /// 3. .fixloop/local.yaml (project local overrides, optional)
    /// 4. Environment variables (FIXLOOP_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(".")
    }

    /// Same as [`load`](Self::load) with the project rooted at `root`.
    pub fn load_from_dir(root: impl AsRef<Path>) -> Result<Config> {
        let dir = root.as_ref().join(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file; environment overrides still apply.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.is_file() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        // Fix settings
        if config.fix.test_command.trim().is_empty() {
            return Err(ConfigError::EmptyTestCommand);
        }
        if config.fix.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        if config.fix.max_output_tokens == 0 {
            return Err(ConfigError::InvalidMaxOutputTokens(0));
        }
        if !(0.0..=1.0).contains(&config.fix.temperature) {
            return Err(ConfigError::InvalidTemperature(config.fix.temperature));
        }
        if config.fix.test_timeout_secs == 0 {
            return Err(ConfigError::InvalidTestTimeout(0));
        }

        // CI settings
        if config.ci.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(0));
        }
        if config.ci.auto_push && !config.ci.auto_commit {
            return Err(ConfigError::ValidationFailed(
                "ci.auto_push requires ci.auto_commit".to_string(),
            ));
        }

        // Budget
        let budget = &config.budget;
        for (name, value) in [
            ("daily_limit_usd", budget.daily_limit_usd),
            ("per_operation_limit_usd", budget.per_operation_limit_usd),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidLimit(name, value));
            }
        }
        if budget.per_operation_limit_usd > budget.daily_limit_usd {
            return Err(ConfigError::PerOperationAboveDaily(
                budget.per_operation_limit_usd,
                budget.daily_limit_usd,
            ));
        }

        // Logging
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        // Proposer
        if ProposerType::parse(&config.proposer.provider).is_none() {
            return Err(ConfigError::UnknownProvider(
                config.proposer.provider.clone(),
            ));
        }

        Ok(())
    }
}
