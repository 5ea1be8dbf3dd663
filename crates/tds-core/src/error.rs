//! Error types for tds-core.
//!
//! Every failure is local to the command that raised it: a command that
//! returns an error leaves the session exactly as it found it.
//!
//! | Error Type | Raised by | Caller action |
//! |------------|-----------|---------------|
//! | [`Error::InvalidState`] | `start_monitoring` while disconnected | Connect first |
//! | [`Error::DeviceUnavailable`] | `connect` when the link handshake fails | Check the port and retry |
//! | [`Error::InvalidConfig`] | `connect` with an empty port or zero baud rate, bad session config | Fix the input |
//! | [`Error::Settings`] | Loading, saving or validating settings | Fix the settings file |
//! | [`Error::Io`] / [`Error::Json`] | Export | Check the destination |
//!
//! The simulated link never produces [`Error::DeviceUnavailable`]; it is part
//! of the interface so that a hardware link can report handshake failures.

use thiserror::Error;

use tds_types::SessionStatus;

use crate::settings::SettingsError;

/// Errors that can occur while operating a monitoring session.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The command's precondition does not hold in the current state.
    #[error("Cannot {operation} while {status}")]
    InvalidState {
        /// The rejected command.
        operation: &'static str,
        /// Session status at the time of the call.
        status: SessionStatus,
    },

    /// The meter could not be reached on the requested port.
    #[error("Device unavailable on {port}: {reason}")]
    DeviceUnavailable {
        /// The port that was tried.
        port: String,
        /// Why the handshake failed.
        reason: String,
    },

    /// Invalid configuration or command argument.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Settings could not be loaded, saved, or validated.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an `InvalidState` error.
    pub fn invalid_state(operation: &'static str, status: SessionStatus) -> Self {
        Self::InvalidState { operation, status }
    }

    /// Create a `DeviceUnavailable` error.
    pub fn device_unavailable(port: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            port: port.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using tds-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
