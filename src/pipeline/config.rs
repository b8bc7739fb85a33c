//! Selection run configuration.
//!
//! Values come from three layers, each overriding the previous one:
//! a YAML file, `SEQPICKER_*` environment variables, and command-line flags.
//! Validation runs once, on the merged result.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::selection::{SelectionOptions, DEFAULT_APPROX_RATIO, DEFAULT_GAIN_DENOMINATOR_OFFSET};

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// IO error while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid YAML.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Default facility-location weight. Redundancy receives `1 - weight`.
pub const DEFAULT_MIXTURE_WEIGHT: f64 = 0.5;

/// Configuration for a selection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionConfig {
    /// Maximum number of representatives. `None` selects every sequence.
    pub max_size: Option<usize>,
    /// Facility-location weight in the default mixture.
    pub mixture_weight: f64,
    /// Approximation ratio, at least 1.0.
    pub approx_ratio: f64,
    /// Explicit acceptance threshold. Defaults to `approx_ratio - 1`.
    pub min_relative_gain: Option<f64>,
    /// Offset added to `|gain|` in the relative gain denominator.
    pub gain_denominator_offset: f64,
    /// Wall-clock limit for the selection loop, in seconds.
    pub timeout_secs: Option<u64>,
    /// Record every identity row in both directions.
    pub symmetric_identities: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_size: None,
            mixture_weight: DEFAULT_MIXTURE_WEIGHT,
            approx_ratio: DEFAULT_APPROX_RATIO,
            min_relative_gain: None,
            gain_denominator_offset: DEFAULT_GAIN_DENOMINATOR_OFFSET,
            timeout_secs: None,
            symmetric_identities: true,
        }
    }
}

impl SelectionConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a configuration from a YAML file. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or is not valid YAML.
    /// Values are checked by [`SelectionConfig::validate`] once every layer
    /// has been applied.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&content)?;
        Ok(config)
    }

    /// Parses a configuration from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Creates configuration from environment variables over the defaults.
    ///
    /// # Environment Variables
    ///
    /// - `SEQPICKER_MAX_SIZE`: Maximum representatives (default: unbounded)
    /// - `SEQPICKER_MIXTURE_WEIGHT`: Facility-location weight (default: 0.5)
    /// - `SEQPICKER_APPROX_RATIO`: Approximation ratio (default: 1.0)
    /// - `SEQPICKER_MIN_RELATIVE_GAIN`: Acceptance threshold (default: ratio - 1)
    /// - `SEQPICKER_GAIN_OFFSET`: Relative gain denominator offset (default: 0.01)
    /// - `SEQPICKER_TIMEOUT_SECS`: Selection time limit (default: none)
    /// - `SEQPICKER_SYMMETRIC`: Record identities in both directions (default: true)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Applies `SEQPICKER_*` environment variables on top of `self`.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`, keyed by environment variable name.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("SEQPICKER_MAX_SIZE") {
            self.max_size = Some(parse_env_value(&val, "SEQPICKER_MAX_SIZE")?);
        }

        if let Some(val) = lookup("SEQPICKER_MIXTURE_WEIGHT") {
            self.mixture_weight = parse_env_value(&val, "SEQPICKER_MIXTURE_WEIGHT")?;
        }

        if let Some(val) = lookup("SEQPICKER_APPROX_RATIO") {
            self.approx_ratio = parse_env_value(&val, "SEQPICKER_APPROX_RATIO")?;
        }

        if let Some(val) = lookup("SEQPICKER_MIN_RELATIVE_GAIN") {
            self.min_relative_gain = Some(parse_env_value(&val, "SEQPICKER_MIN_RELATIVE_GAIN")?);
        }

        if let Some(val) = lookup("SEQPICKER_GAIN_OFFSET") {
            self.gain_denominator_offset = parse_env_value(&val, "SEQPICKER_GAIN_OFFSET")?;
        }

        if let Some(val) = lookup("SEQPICKER_TIMEOUT_SECS") {
            self.timeout_secs = Some(parse_env_value(&val, "SEQPICKER_TIMEOUT_SECS")?);
        }

        if let Some(val) = lookup("SEQPICKER_SYMMETRIC") {
            self.symmetric_identities = parse_env_bool(&val, "SEQPICKER_SYMMETRIC")?;
        }

        Ok(self)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size == Some(0) {
            return Err(ConfigError::ValidationFailed(
                "max_size must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.mixture_weight) {
            return Err(ConfigError::ValidationFailed(
                "mixture_weight must be between 0.0 and 1.0".to_string(),
            ));
        }

        if !self.approx_ratio.is_finite() || self.approx_ratio < 1.0 {
            return Err(ConfigError::ValidationFailed(
                "approx_ratio must be at least 1.0".to_string(),
            ));
        }

        if let Some(gain) = self.min_relative_gain {
            if !gain.is_finite() {
                return Err(ConfigError::ValidationFailed(
                    "min_relative_gain must be finite".to_string(),
                ));
            }
        }

        if !self.gain_denominator_offset.is_finite() || self.gain_denominator_offset <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "gain_denominator_offset must be greater than 0".to_string(),
            ));
        }

        if self.timeout_secs == Some(0) {
            return Err(ConfigError::ValidationFailed(
                "timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder method to set the maximum number of representatives.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Builder method to set the facility-location weight.
    pub fn with_mixture_weight(mut self, weight: f64) -> Self {
        self.mixture_weight = weight;
        self
    }

    /// Builder method to set the approximation ratio.
    pub fn with_approx_ratio(mut self, ratio: f64) -> Self {
        self.approx_ratio = ratio;
        self
    }

    /// Builder method to set the acceptance threshold.
    pub fn with_min_relative_gain(mut self, gain: f64) -> Self {
        self.min_relative_gain = Some(gain);
        self
    }

    /// Builder method to set the gain denominator offset.
    pub fn with_gain_denominator_offset(mut self, offset: f64) -> Self {
        self.gain_denominator_offset = offset;
        self
    }

    /// Builder method to set the selection time limit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs());
        self
    }

    /// Builder method to choose symmetric or one-way identity recording.
    pub fn with_symmetric_identities(mut self, symmetric: bool) -> Self {
        self.symmetric_identities = symmetric;
        self
    }

    /// Selection time limit, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Builds selector options. The deadline, if any, starts now.
    pub fn to_options(&self) -> SelectionOptions {
        let mut options = SelectionOptions::new()
            .with_approx_ratio(self.approx_ratio)
            .with_gain_denominator_offset(self.gain_denominator_offset);

        if let Some(max_size) = self.max_size {
            options = options.with_max_size(max_size);
        }
        if let Some(gain) = self.min_relative_gain {
            options = options.with_min_relative_gain(gain);
        }
        if let Some(timeout) = self.timeout() {
            options = options.with_timeout(timeout);
        }
        options
    }
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

/// Parse an environment variable as a boolean.
fn parse_env_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean value, got '{}'", value),
        }),
    }
}
