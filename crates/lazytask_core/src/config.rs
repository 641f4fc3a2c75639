//! Core runtime configuration.
//!
//! # Responsibility
//! - Carry tunables shared by ordering, logging and the task service.
//! - Parse host-provided JSON with defaults for every missing field.
//!
//! # Invariants
//! - `priority_spacing` is finite and strictly positive after `validate()`.
//! - `log_level` is one of `trace|debug|info|warn|error` after `validate()`.

use crate::logging::{default_log_level, normalize_level};
use crate::ordering::DEFAULT_PRIORITY_SPACING;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from configuration parsing and validation.
#[derive(Debug)]
pub enum ConfigError {
    /// Input is not valid JSON for `CoreConfig`.
    Parse(serde_json::Error),
    /// Spacing is zero, negative, NaN or infinite.
    InvalidSpacing(f64),
    /// Log level is not recognized.
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid core config: {err}"),
            Self::InvalidSpacing(value) => {
                write!(f, "priority_spacing must be finite and > 0, got {value}")
            }
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::InvalidSpacing(_) => None,
            Self::InvalidLogLevel(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Tunables injected into a [`crate::Session`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Gap used beyond the head/tail and when respacing a parent.
    pub priority_spacing: f64,
    /// Level passed to `init_logging` by hosts.
    pub log_level: String,
    /// Respace a parent's children when a new priority would collide.
    pub respace_on_collision: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            priority_spacing: DEFAULT_PRIORITY_SPACING,
            log_level: default_log_level().to_string(),
            respace_on_collision: true,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON object; missing fields take defaults.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.priority_spacing.is_finite() || self.priority_spacing <= 0.0 {
            return Err(ConfigError::InvalidSpacing(self.priority_spacing));
        }
        normalize_level(&self.log_level).map_err(ConfigError::InvalidLogLevel)?;
        Ok(())
    }
}
