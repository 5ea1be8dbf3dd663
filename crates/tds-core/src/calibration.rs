//! Linear calibration of raw meter values.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Linear calibration applied to every raw TDS value.
///
/// The calibrated value is `raw * slope + offset`, clamped at zero since a
/// dissolved solids concentration cannot be negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Added after scaling, in ppm.
    pub offset: f64,
    /// Multiplier applied to the raw value.
    pub slope: f64,
    /// When the meter was last calibrated.
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_calibrated: Option<OffsetDateTime>,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            offset: 0.0,
            slope: 1.0,
            last_calibrated: None,
        }
    }
}

impl Calibration {
    /// Create a calibration with the given coefficients.
    pub fn new(offset: f64, slope: f64) -> Self {
        Self {
            offset,
            slope,
            last_calibrated: None,
        }
    }

    /// Whether this calibration leaves values unchanged.
    pub fn is_identity(&self) -> bool {
        self.offset == 0.0 && self.slope == 1.0
    }

    /// Apply the calibration to a raw value.
    ///
    /// Negative results are clamped to zero. NaN passes through unchanged.
    pub fn apply(&self, raw: f64) -> f64 {
        let value = raw * self.slope + self.offset;
        if value < 0.0 { 0.0 } else { value }
    }

    /// Record that the meter was calibrated at `now`.
    pub fn mark_calibrated(&mut self, now: OffsetDateTime) {
        self.last_calibrated = Some(now);
    }

    /// Check the coefficients, returning a message per problem.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !self.offset.is_finite() {
            problems.push(format!("offset must be a finite number, got {}", self.offset));
        }
        if !self.slope.is_finite() || self.slope <= 0.0 {
            problems.push(format!("slope must be a positive number, got {}", self.slope));
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_default_is_identity() {
        let cal = Calibration::default();
        assert!(cal.is_identity());
        assert_eq!(cal.apply(123.4), 123.4);
        assert!(cal.last_calibrated.is_none());
    }

    #[test]
    fn test_apply_offset_and_slope() {
        let cal = Calibration::new(5.0, 2.0);
        assert_eq!(cal.apply(10.0), 25.0);
        assert!(!cal.is_identity());
    }

    #[test]
    fn test_apply_clamps_at_zero() {
        let cal = Calibration::new(-50.0, 1.0);
        assert_eq!(cal.apply(20.0), 0.0);
    }

    #[test]
    fn test_apply_keeps_nan() {
        assert!(Calibration::default().apply(f64::NAN).is_nan());
        assert!(Calibration::new(-50.0, 2.0).apply(f64::NAN).is_nan());
    }

    #[test]
    fn test_mark_calibrated() {
        let mut cal = Calibration::default();
        let now = datetime!(2024-05-01 08:30:00 UTC);
        cal.mark_calibrated(now);
        assert_eq!(cal.last_calibrated, Some(now));
    }

    #[test]
    fn test_problems() {
        assert!(Calibration::default().problems().is_empty());
        assert_eq!(Calibration::new(0.0, 0.0).problems().len(), 1);
        assert_eq!(Calibration::new(f64::NAN, -1.0).problems().len(), 2);
    }

    #[test]
    fn test_toml_roundtrip_with_timestamp() {
        let mut cal = Calibration::new(1.5, 0.98);
        cal.mark_calibrated(datetime!(2024-05-01 08:30:00 UTC));

        let text = toml::to_string(&cal).unwrap();
        assert!(text.contains("last_calibrated = \"2024-05-01T08:30:00Z\""));

        let parsed: Calibration = toml::from_str(&text).unwrap();
        assert_eq!(parsed, cal);
    }

    #[test]
    fn test_toml_without_timestamp() {
        let text = toml::to_string(&Calibration::default()).unwrap();
        assert!(!text.contains("last_calibrated"));
        let parsed: Calibration = toml::from_str("slope = 1.1").unwrap();
        assert_eq!(parsed.slope, 1.1);
        assert_eq!(parsed.offset, 0.0);
        assert!(parsed.last_calibrated.is_none());
    }
}
