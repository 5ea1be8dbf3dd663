//! Core types for TDS meter data.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ParseError;

/// Upper bound (inclusive) of the [`Quality::Excellent`] band, in ppm.
pub const EXCELLENT_MAX_PPM: f64 = 50.0;

/// Upper bound (inclusive) of the [`Quality::Good`] band, in ppm.
pub const GOOD_MAX_PPM: f64 = 150.0;

/// Upper bound (inclusive) of the [`Quality::Fair`] band, in ppm.
pub const FAIR_MAX_PPM: f64 = 300.0;

/// Default serial baud rate of a meter.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Water quality band derived from a TDS value.
///
/// # Ordering
///
/// Bands are ordered from best to worst: `Excellent < Good < Fair < Poor`.
/// This allows comparisons like `if quality >= Quality::Fair { warn!(...) }`.
///
/// # Display vs Serialization
///
/// `Display` returns the capitalised label shown to users ("Excellent"),
/// while serde and [`Quality::as_str`] use the lowercase label ("excellent")
/// that also appears in exported files.
///
/// ```
/// use tds_types::Quality;
///
/// assert_eq!(format!("{}", Quality::Good), "Good");
/// assert_eq!(Quality::Good.as_str(), "good");
/// assert!(Quality::Poor > Quality::Fair);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Quality {
    /// At most 50 ppm.
    Excellent,
    /// Above 50 and at most 150 ppm.
    Good,
    /// Above 150 and at most 300 ppm.
    Fair,
    /// Above 300 ppm.
    Poor,
}

impl Quality {
    /// All bands from best to worst.
    pub const ALL: [Quality; 4] = [
        Quality::Excellent,
        Quality::Good,
        Quality::Fair,
        Quality::Poor,
    ];

    /// Classify a TDS value (ppm) into a quality band.
    ///
    /// Total over all inputs: each boundary value belongs to the better band,
    /// and anything that is not `<= 300` (including NaN) is [`Quality::Poor`].
    ///
    /// ```
    /// use tds_types::Quality;
    ///
    /// assert_eq!(Quality::classify(50.0), Quality::Excellent);
    /// assert_eq!(Quality::classify(50.0001), Quality::Good);
    /// assert_eq!(Quality::classify(300.0), Quality::Fair);
    /// assert_eq!(Quality::classify(f64::NAN), Quality::Poor);
    /// ```
    #[must_use]
    pub fn classify(value: f64) -> Self {
        if value <= EXCELLENT_MAX_PPM {
            Quality::Excellent
        } else if value <= GOOD_MAX_PPM {
            Quality::Good
        } else if value <= FAIR_MAX_PPM {
            Quality::Fair
        } else {
            Quality::Poor
        }
    }

    /// Lowercase label used in serialization and exports.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Excellent => "excellent",
            Quality::Good => "good",
            Quality::Fair => "fair",
            Quality::Poor => "poor",
        }
    }

    /// Get a human-readable description of the band.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Quality::Excellent => "Excellent - ideal for drinking",
            Quality::Good => "Good - typical treated tap water",
            Quality::Fair => "Fair - noticeable mineral content",
            Quality::Poor => "Poor - not recommended for drinking",
        }
    }

    /// Get the suggested action for this band.
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            Quality::Excellent | Quality::Good => "No action needed",
            Quality::Fair => "Consider filtering before drinking",
            Quality::Poor => "Treat the water or use another source",
        }
    }
}

/// Classify a TDS value (ppm) into a quality band.
///
/// Shorthand for [`Quality::classify`].
#[must_use]
pub fn classify(value: f64) -> Quality {
    Quality::classify(value)
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Excellent => write!(f, "Excellent"),
            Quality::Good => write!(f, "Good"),
            Quality::Fair => write!(f, "Fair"),
            Quality::Poor => write!(f, "Poor"),
        }
    }
}

impl FromStr for Quality {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "excellent" => Ok(Quality::Excellent),
            "good" => Ok(Quality::Good),
            "fair" => Ok(Quality::Fair),
            "poor" => Ok(Quality::Poor),
            _ => Err(ParseError::UnknownQuality(s.to_string())),
        }
    }
}

/// A single TDS measurement.
///
/// Readings are immutable. The quality band is computed from the value when
/// the reading is built and cannot be set independently; deserializing a
/// reading recomputes it as well, ignoring any stored label.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "ReadingRepr"))]
pub struct Reading {
    id: Uuid,
    value: f64,
    temperature: f64,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    timestamp: OffsetDateTime,
    quality: Quality,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct ReadingRepr {
    id: Uuid,
    value: f64,
    temperature: f64,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
}

#[cfg(feature = "serde")]
impl From<ReadingRepr> for Reading {
    fn from(repr: ReadingRepr) -> Self {
        Reading::with_id(repr.id, repr.value, repr.temperature, repr.timestamp)
    }
}

impl Reading {
    /// Build a reading with a fresh random identifier.
    #[must_use]
    pub fn new(value: f64, temperature: f64, timestamp: OffsetDateTime) -> Self {
        Self::with_id(Uuid::new_v4(), value, temperature, timestamp)
    }

    /// Build a reading with an explicit identifier.
    #[must_use]
    pub fn with_id(id: Uuid, value: f64, temperature: f64, timestamp: OffsetDateTime) -> Self {
        Self {
            id,
            value,
            temperature,
            timestamp,
            quality: Quality::classify(value),
        }
    }

    /// Unique identifier of this reading.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// TDS value in ppm.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Water temperature in degrees Celsius.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// When the reading was captured (UTC).
    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    /// Quality band of [`value`](Self::value).
    pub fn quality(&self) -> Quality {
        self.quality
    }
}

/// Connection state of the meter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceState {
    /// Whether a meter is connected.
    pub is_connected: bool,
    /// Port identifier, `None` when disconnected.
    pub port: Option<String>,
    /// Serial baud rate.
    pub baud_rate: u32,
    /// Most recent reading, `None` when disconnected.
    pub last_reading: Option<Reading>,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            is_connected: false,
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            last_reading: None,
        }
    }
}

/// Lifecycle state of a monitoring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SessionStatus {
    /// No meter connected.
    Disconnected,
    /// Connected, not sampling.
    Idle,
    /// Connected and sampling periodically.
    Monitoring,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Disconnected => write!(f, "disconnected"),
            SessionStatus::Idle => write!(f, "connected (idle)"),
            SessionStatus::Monitoring => write!(f, "monitoring"),
        }
    }
}

/// Unit used to display temperatures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Convert a Celsius temperature into this unit.
    #[must_use]
    pub fn convert(&self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    /// Unit symbol including the degree sign.
    #[must_use]
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemperatureUnit::Celsius => write!(f, "celsius"),
            TemperatureUnit::Fahrenheit => write!(f, "fahrenheit"),
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "celsius" => Ok(TemperatureUnit::Celsius),
            "f" | "fahrenheit" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(ParseError::UnknownTemperatureUnit(s.to_string())),
        }
    }
}
