//! Engine thresholds and naming.
//!
//! # Responsibility
//! - Hold the foreground alert radius and background geofence radius as two
//!   independently configurable values.
//! - Parse host-provided JSON with per-field defaults.
//!
//! # Invariants
//! - Radii are finite and strictly positive.
//! - The notification body budget is at least one character.

use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default distance (meters) under which a foreground fix raises an alert.
pub const DEFAULT_FOREGROUND_ALERT_RADIUS_M: f64 = 50.0;
/// Default radius (meters) of every OS-monitored geofence region.
pub const DEFAULT_GEOFENCE_RADIUS_M: f64 = 100.0;
/// Default character budget for the quoted notification body.
pub const DEFAULT_NOTIFICATION_BODY_MAX_CHARS: usize = 50;
/// Default name the background geofence task is defined under.
pub const DEFAULT_TASK_NAME: &str = "MEMORY_GEOFENCING_TASK";

/// Runtime configuration for one engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub foreground_alert_radius_m: f64,
    pub geofence_radius_m: f64,
    pub notification_body_max_chars: usize,
    pub task_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            foreground_alert_radius_m: DEFAULT_FOREGROUND_ALERT_RADIUS_M,
            geofence_radius_m: DEFAULT_GEOFENCE_RADIUS_M,
            notification_body_max_chars: DEFAULT_NOTIFICATION_BODY_MAX_CHARS,
            task_name: DEFAULT_TASK_NAME.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parses a JSON document; missing fields fall back to defaults and an
    /// empty or whitespace-only input yields the default config.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks field ranges.
    ///
    /// A foreground radius that is not smaller than the geofence radius is
    /// accepted; it only produces a warning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_radius("foreground_alert_radius_m", self.foreground_alert_radius_m)?;
        check_radius("geofence_radius_m", self.geofence_radius_m)?;
        if self.notification_body_max_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "notification_body_max_chars",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.task_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "task_name",
                reason: "must not be blank".to_string(),
            });
        }
        if self.foreground_alert_radius_m >= self.geofence_radius_m {
            warn!(
                "event=config_validate module=config status=warn foreground_radius_m={} geofence_radius_m={} detail=foreground_not_smaller",
                self.foreground_alert_radius_m, self.geofence_radius_m
            );
        }
        Ok(())
    }
}

fn check_radius(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::InvalidValue {
            field,
            reason: format!("must be a finite positive number of meters, got {value}"),
        });
    }
    Ok(())
}

/// Configuration parse/validation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Parse(String),
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid engine config json: {message}"),
            Self::InvalidValue { field, reason } => write!(f, "invalid `{field}`: {reason}"),
        }
    }
}

impl Error for ConfigError {}
