//! Monitoring core for simulated TDS water-quality meters.
//!
//! This crate owns the state of one meter session: the connection, the latest
//! reading, a bounded reading history, and the periodic sampling loop.
//!
//! # Features
//!
//! - **Monitoring session**: connect, disconnect, start/stop periodic sampling,
//!   clear history
//! - **Notifications**: broadcast [`SessionEvent`]s and a watch channel of
//!   [`SessionSnapshot`]s
//! - **Pluggable sources**: random, scripted, or closure-based raw samples
//! - **Meter link**: the handshake seam, simulated by default
//! - **Calibration and alerts**: linear calibration, TDS and temperature
//!   thresholds
//! - **History tools**: period filters, statistics, CSV and JSON export
//! - **Settings**: a validated TOML settings file
//!
//! # Quick Start
//!
//! ```no_run
//! use tds_core::{MonitoringSession, SessionEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = MonitoringSession::new();
//!     let mut events = session.subscribe();
//!
//!     session.connect("COM3", 9600).await?;
//!     session.start_monitoring().await?;
//!
//!     while let Ok(event) = events.recv().await {
//!         if let SessionEvent::Reading { reading } = event {
//!             println!("{:.1} ppm ({})", reading.value(), reading.quality());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod alerts;
pub mod calibration;
pub mod error;
pub mod events;
pub mod export;
pub mod history;
pub mod link;
pub mod session;
pub mod settings;
pub mod source;

// Core exports
pub use error::{Error, Result};
pub use session::{MonitoringSession, SessionBuilder, SessionConfig};

pub use alerts::{Alert, AlertThresholds};
pub use calibration::Calibration;
pub use events::{EventDispatcher, EventReceiver, EventSender, SessionEvent, SessionSnapshot};
pub use export::ExportFormat;
pub use history::{HistoryStats, Period, ReadingHistory};
pub use link::{MeterLink, SimulatedLink};
pub use settings::{Settings, SettingsError, ValidationError};
pub use source::{RandomSource, ReadingGenerator, ReadingSource, Sample, SequenceSource};

// Re-export from tds-types
pub use tds_types::{DeviceState, Quality, Reading, SessionStatus, TemperatureUnit, classify};
