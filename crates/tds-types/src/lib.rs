//! Platform-agnostic types for simulated TDS water-quality meters.
//!
//! This crate provides the shared data model used by the monitoring core
//! (tds-core) and by front ends such as the `tds` command-line tool.
//!
//! # Features
//!
//! - Immutable [`Reading`]s whose [`Quality`] is always derived from the value
//! - The quality classifier ([`classify`])
//! - Device connection state and session status
//! - Error types for label parsing
//!
//! # Example
//!
//! ```
//! use tds_types::{Quality, Reading};
//! use time::OffsetDateTime;
//!
//! let reading = Reading::new(120.0, 22.5, OffsetDateTime::now_utc());
//! assert_eq!(reading.quality(), Quality::Good);
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{
    DEFAULT_BAUD_RATE, DeviceState, EXCELLENT_MAX_PPM, FAIR_MAX_PPM, GOOD_MAX_PPM, Quality,
    Reading, SessionStatus, TemperatureUnit, classify,
};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use time::OffsetDateTime;
    use time::macros::datetime;
    use uuid::Uuid;

    // --- Classifier tests ---

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(50.0), Quality::Excellent);
        assert_eq!(classify(50.0001), Quality::Good);
        assert_eq!(classify(150.0), Quality::Good);
        assert_eq!(classify(150.0001), Quality::Fair);
        assert_eq!(classify(300.0), Quality::Fair);
        assert_eq!(classify(300.0001), Quality::Poor);
    }

    #[test]
    fn test_classify_extremes() {
        assert_eq!(classify(0.0), Quality::Excellent);
        assert_eq!(classify(-10.0), Quality::Excellent);
        assert_eq!(classify(f64::NEG_INFINITY), Quality::Excellent);
        assert_eq!(classify(10_000.0), Quality::Poor);
        assert_eq!(classify(f64::INFINITY), Quality::Poor);
        assert_eq!(classify(f64::NAN), Quality::Poor);
    }

    proptest! {
        #[test]
        fn prop_classify_is_deterministic(value in proptest::num::f64::ANY) {
            prop_assert_eq!(classify(value), classify(value));
        }

        #[test]
        fn prop_classify_is_monotonic(a in -1000.0f64..1000.0, b in -1000.0f64..1000.0) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(classify(low) <= classify(high));
        }

        #[test]
        fn prop_reading_quality_matches_value(value in 0.0f64..1000.0, temp in 0.0f64..40.0) {
            let reading = Reading::new(value, temp, OffsetDateTime::UNIX_EPOCH);
            prop_assert_eq!(reading.quality(), classify(value));
        }
    }

    // --- Quality tests ---

    #[test]
    fn test_quality_labels() {
        assert_eq!(Quality::Excellent.as_str(), "excellent");
        assert_eq!(Quality::Poor.as_str(), "poor");
        assert_eq!(format!("{}", Quality::Fair), "Fair");
    }

    #[test]
    fn test_quality_from_str() {
        assert_eq!("good".parse::<Quality>(), Ok(Quality::Good));
        assert_eq!(" POOR ".parse::<Quality>(), Ok(Quality::Poor));
        assert_eq!(
            "murky".parse::<Quality>(),
            Err(ParseError::UnknownQuality("murky".to_string()))
        );
    }

    #[test]
    fn test_quality_ordering() {
        assert!(Quality::Excellent < Quality::Good);
        assert!(Quality::Good < Quality::Fair);
        assert!(Quality::Fair < Quality::Poor);
    }

    #[test]
    fn test_quality_descriptions_and_actions() {
        assert!(Quality::Excellent.description().contains("Excellent"));
        assert!(Quality::Poor.description().contains("Poor"));
        assert!(Quality::Good.action().contains("No action"));
        assert!(Quality::Poor.action().contains("Treat"));
    }

    // --- Reading tests ---

    #[test]
    fn test_reading_accessors() {
        let ts = datetime!(2024-03-01 12:00:00 UTC);
        let reading = Reading::new(42.0, 21.5, ts);

        assert_eq!(reading.value(), 42.0);
        assert_eq!(reading.temperature(), 21.5);
        assert_eq!(reading.timestamp(), ts);
        assert_eq!(reading.quality(), Quality::Excellent);
    }

    #[test]
    fn test_reading_ids_are_unique() {
        let a = Reading::new(1.0, 20.0, OffsetDateTime::UNIX_EPOCH);
        let b = Reading::new(1.0, 20.0, OffsetDateTime::UNIX_EPOCH);
        assert_ne!(a.id(), b.id());
    }

    // --- Serialization tests ---

    #[test]
    fn test_reading_serialization() {
        let id = Uuid::nil();
        let reading = Reading::with_id(id, 200.5, 24.0, datetime!(2024-03-01 12:00:00 UTC));

        let json = serde_json::to_string(&reading).unwrap();
        assert!(json.contains("\"value\":200.5"));
        assert!(json.contains("\"quality\":\"fair\""));
        assert!(json.contains("\"timestamp\":\"2024-03-01T12:00:00Z\""));
    }

    #[test]
    fn test_reading_deserialization_recomputes_quality() {
        let json = r#"{"id":"00000000-0000-0000-0000-000000000000","value":400.0,"temperature":22.0,"timestamp":"2024-03-01T12:00:00Z","quality":"excellent"}"#;

        let reading: Reading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.value(), 400.0);
        assert_eq!(reading.quality(), Quality::Poor);
    }

    #[test]
    fn test_quality_serialization() {
        assert_eq!(
            serde_json::to_string(&Quality::Excellent).unwrap(),
            "\"excellent\""
        );
        let parsed: Quality = serde_json::from_str("\"fair\"").unwrap();
        assert_eq!(parsed, Quality::Fair);
    }

    // --- DeviceState / status tests ---

    #[test]
    fn test_device_state_default() {
        let state = DeviceState::default();
        assert!(!state.is_connected);
        assert!(state.port.is_none());
        assert_eq!(state.baud_rate, 9600);
        assert!(state.last_reading.is_none());
    }

    #[test]
    fn test_session_status_display() {
        assert_eq!(SessionStatus::Disconnected.to_string(), "disconnected");
        assert_eq!(SessionStatus::Monitoring.to_string(), "monitoring");
    }

    // --- TemperatureUnit tests ---

    #[test]
    fn test_temperature_unit_conversion() {
        assert_eq!(TemperatureUnit::Celsius.convert(25.0), 25.0);
        assert!((TemperatureUnit::Fahrenheit.convert(25.0) - 77.0).abs() < 1e-9);
        assert!((TemperatureUnit::Fahrenheit.convert(0.0) - 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_temperature_unit_from_str() {
        assert_eq!("F".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Fahrenheit));
        assert_eq!("celsius".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Celsius));
        assert!("kelvin".parse::<TemperatureUnit>().is_err());
    }
}
