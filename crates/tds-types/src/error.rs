//! Error types for label parsing in tds-types.

use thiserror::Error;

/// Errors that can occur when parsing TDS meter labels.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The label does not name a quality band.
    #[error("Unknown quality label: {0}")]
    UnknownQuality(String),

    /// The label does not name a temperature unit.
    #[error("Unknown temperature unit: {0}")]
    UnknownTemperatureUnit(String),

    /// The label does not name a history period.
    #[error("Unknown period: {0} (expected 1h, 6h, 24h, 7d or 30d)")]
    UnknownPeriod(String),
}

/// Result type alias using tds-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
