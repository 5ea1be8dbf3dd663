//! Alert thresholds for TDS and temperature readings.
//!
//! Thresholds flag readings that leave the configured comfort band. They are
//! independent of the quality bands: a reading can be `Good` and still raise a
//! low-TDS alert for water that is too soft.
//!
//! # Example
//!
//! ```
//! use tds_core::alerts::{Alert, AlertThresholds};
//! use tds_types::Reading;
//! use time::OffsetDateTime;
//!
//! let thresholds = AlertThresholds::default();
//! let reading = Reading::new(420.0, 22.0, OffsetDateTime::now_utc());
//!
//! let alerts = thresholds.evaluate(&reading);
//! assert_eq!(alerts, vec![Alert::TdsHigh { value: 420.0, threshold: 300.0 }]);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use tds_types::Reading;

/// A threshold crossed by a reading.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new alert kinds
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum Alert {
    /// TDS above the high threshold.
    TdsHigh { value: f64, threshold: f64 },
    /// TDS below the low threshold.
    TdsLow { value: f64, threshold: f64 },
    /// Temperature above the high threshold.
    TemperatureHigh { value: f64, threshold: f64 },
    /// Temperature below the low threshold.
    TemperatureLow { value: f64, threshold: f64 },
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::TdsHigh { value, threshold } => {
                write!(f, "TDS {:.1} ppm exceeds {:.1} ppm", value, threshold)
            }
            Alert::TdsLow { value, threshold } => {
                write!(f, "TDS {:.1} ppm is below {:.1} ppm", value, threshold)
            }
            Alert::TemperatureHigh { value, threshold } => {
                write!(f, "Temperature {:.1}°C exceeds {:.1}°C", value, threshold)
            }
            Alert::TemperatureLow { value, threshold } => {
                write!(f, "Temperature {:.1}°C is below {:.1}°C", value, threshold)
            }
        }
    }
}

/// Configuration for reading alerts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Alert when TDS rises above this value (ppm).
    pub high_tds: f64,
    /// Alert when TDS falls below this value (ppm).
    pub low_tds: f64,
    /// Alert when temperature rises above this value (°C).
    pub high_temp: f64,
    /// Alert when temperature falls below this value (°C).
    pub low_temp: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            high_tds: 300.0,
            low_tds: 50.0,
            high_temp: 30.0,
            low_temp: 10.0,
        }
    }
}

impl AlertThresholds {
    /// Evaluate a reading against all thresholds.
    pub fn evaluate(&self, reading: &Reading) -> Vec<Alert> {
        let mut alerts = Vec::new();
        let value = reading.value();
        let temperature = reading.temperature();

        if value > self.high_tds {
            alerts.push(Alert::TdsHigh {
                value,
                threshold: self.high_tds,
            });
        } else if value < self.low_tds {
            alerts.push(Alert::TdsLow {
                value,
                threshold: self.low_tds,
            });
        }

        if temperature > self.high_temp {
            alerts.push(Alert::TemperatureHigh {
                value: temperature,
                threshold: self.high_temp,
            });
        } else if temperature < self.low_temp {
            alerts.push(Alert::TemperatureLow {
                value: temperature,
                threshold: self.low_temp,
            });
        }

        alerts
    }

    /// Check that each low threshold sits below its high threshold.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !(self.low_tds < self.high_tds) {
            problems.push(format!(
                "low_tds ({}) must be below high_tds ({})",
                self.low_tds, self.high_tds
            ));
        }
        if !(self.low_temp < self.high_temp) {
            problems.push(format!(
                "low_temp ({}) must be below high_temp ({})",
                self.low_temp, self.high_temp
            ));
        }
        problems
    }
}
