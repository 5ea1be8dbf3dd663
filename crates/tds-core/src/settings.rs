//! Persisted user settings.
//!
//! Settings are stored as a single TOML document. Missing keys fall back to
//! their defaults, so an empty file is a valid settings file.
//!
//! ```toml
//! auto_connect = false
//! monitoring_interval_ms = 2000
//! data_retention = 100
//! temperature_unit = "celsius"
//!
//! [alerts]
//! high_tds = 300.0
//! low_tds = 50.0
//! high_temp = 30.0
//! low_temp = 10.0
//!
//! [calibration]
//! offset = 0.0
//! slope = 1.0
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tds_types::TemperatureUnit;

use crate::alerts::AlertThresholds;
use crate::calibration::Calibration;
use crate::history::DEFAULT_RETENTION;
use crate::session::SessionConfig;

/// Shortest accepted sampling interval.
pub const MIN_INTERVAL_MS: u64 = 100;
/// Longest accepted sampling interval (1 hour).
pub const MAX_INTERVAL_MS: u64 = 3_600_000;
/// Smallest accepted retention.
pub const MIN_RETENTION: usize = 10;
/// Largest accepted retention.
pub const MAX_RETENTION: usize = 10_000;

/// Keys accepted by [`Settings::set`].
pub const KEYS: &[&str] = &[
    "auto_connect",
    "monitoring_interval_ms",
    "data_retention",
    "temperature_unit",
    "alerts.high_tds",
    "alerts.low_tds",
    "alerts.high_temp",
    "alerts.low_temp",
    "calibration.offset",
    "calibration.slope",
];

/// User settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Connect to the last used port on startup.
    pub auto_connect: bool,
    /// Sampling interval in milliseconds.
    pub monitoring_interval_ms: u64,
    /// Number of readings kept in history.
    pub data_retention: usize,
    /// Unit used when displaying temperatures.
    pub temperature_unit: TemperatureUnit,
    /// Alert thresholds.
    pub alerts: AlertThresholds,
    /// Calibration coefficients.
    pub calibration: Calibration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_connect: false,
            monitoring_interval_ms: 2000,
            data_retention: DEFAULT_RETENTION,
            temperature_unit: TemperatureUnit::Celsius,
            alerts: AlertThresholds::default(),
            calibration: Calibration::default(),
        }
    }
}

impl Settings {
    /// Load settings from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load and validate settings from a file.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let settings = Self::load(path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a file, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(SettingsError::Serialize)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path, content).map_err(|e| SettingsError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Restore every setting to its default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Validate the settings, collecting every problem.
    ///
    /// This checks:
    /// - The sampling interval is between 100 ms and 1 hour
    /// - Retention is between 10 and 10000 readings
    /// - Each low alert threshold is below its high threshold
    /// - Calibration slope is positive and offset is finite
    pub fn validate(&self) -> Result<(), SettingsError> {
        let mut errors = Vec::new();

        if !(MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&self.monitoring_interval_ms) {
            errors.push(ValidationError::new(
                "monitoring_interval_ms",
                format!(
                    "must be between {} and {} ms, got {}",
                    MIN_INTERVAL_MS, MAX_INTERVAL_MS, self.monitoring_interval_ms
                ),
            ));
        }

        if !(MIN_RETENTION..=MAX_RETENTION).contains(&self.data_retention) {
            errors.push(ValidationError::new(
                "data_retention",
                format!(
                    "must be between {} and {} readings, got {}",
                    MIN_RETENTION, MAX_RETENTION, self.data_retention
                ),
            ));
        }

        errors.extend(
            self.alerts
                .problems()
                .into_iter()
                .map(|message| ValidationError::new("alerts", message)),
        );
        errors.extend(
            self.calibration
                .problems()
                .into_iter()
                .map(|message| ValidationError::new("calibration", message)),
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SettingsError::Validation(errors))
        }
    }

    /// Set a single value by key, parsing it from a string.
    ///
    /// The change is not validated; call [`Settings::validate`] afterwards.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let invalid = |message: String| SettingsError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let parse_f64 = |value: &str| -> Result<f64, SettingsError> {
            value
                .trim()
                .parse::<f64>()
                .map_err(|e| invalid(format!("'{}' is not a number: {}", value, e)))
        };

        match key {
            "auto_connect" => {
                self.auto_connect = value
                    .trim()
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("'{}' is not true or false", value)))?;
            }
            "monitoring_interval_ms" => {
                self.monitoring_interval_ms = value
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| invalid(format!("'{}' is not a whole number: {}", value, e)))?;
            }
            "data_retention" => {
                self.data_retention = value
                    .trim()
                    .parse::<usize>()
                    .map_err(|e| invalid(format!("'{}' is not a whole number: {}", value, e)))?;
            }
            "temperature_unit" => {
                self.temperature_unit = value
                    .parse::<TemperatureUnit>()
                    .map_err(|e| invalid(e.to_string()))?;
            }
            "alerts.high_tds" => self.alerts.high_tds = parse_f64(value)?,
            "alerts.low_tds" => self.alerts.low_tds = parse_f64(value)?,
            "alerts.high_temp" => self.alerts.high_temp = parse_f64(value)?,
            "alerts.low_temp" => self.alerts.low_temp = parse_f64(value)?,
            "calibration.offset" => self.calibration.offset = parse_f64(value)?,
            "calibration.slope" => self.calibration.slope = parse_f64(value)?,
            _ => return Err(SettingsError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Session configuration derived from these settings.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            sampling_interval: Duration::from_millis(self.monitoring_interval_ms),
            retention: self.data_retention,
            calibration: self.calibration,
            alerts: self.alerts,
            ..SessionConfig::default()
        }
    }
}

/// Settings errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize settings: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unknown setting '{0}'")]
    UnknownKey(String),
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("Settings validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field path (e.g., `data_retention` or `alerts`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}
