//! Serializable service configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors from loading or validating a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for the signal service: live-signal window and cache lifetimes.
///
/// Every field has a default so a partial (or absent) config file works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Bars fetched per timeframe for the live signal.
    pub signal_limit: usize,
    /// Default score threshold when no optimizer suggestion is cached.
    pub default_threshold: f64,
    /// Raw-bar cache lifetime, seconds.
    pub bar_ttl_secs: u64,
    /// Last-good-signal cache lifetime, seconds.
    pub signal_ttl_secs: u64,
    /// Optimizer-suggestion cache lifetime, seconds.
    pub optimizer_ttl_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            signal_limit: 300,
            default_threshold: 0.6,
            bar_ttl_secs: 60,
            signal_ttl_secs: 120,
            optimizer_ttl_secs: 900,
        }
    }
}

impl ServiceConfig {
    /// Load from a TOML file and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: ServiceConfig = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signal_limit < 100 || self.signal_limit > 1000 {
            return Err(ConfigError::Invalid(format!(
                "signal_limit must be in [100, 1000], got {}",
                self.signal_limit
            )));
        }
        if !(self.default_threshold > 0.0 && self.default_threshold < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "default_threshold must be in (0, 1), got {}",
                self.default_threshold
            )));
        }
        Ok(())
    }
}
