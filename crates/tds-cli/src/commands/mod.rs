//! Command implementations for the CLI.

mod calibrate;
mod config;
mod read;
mod watch;

pub use calibrate::{CalibrateArgs, cmd_calibrate};
pub use config::cmd_config;
pub use read::cmd_read;
pub use watch::{WatchArgs, cmd_watch};

use std::time::Duration;

use anyhow::Result;
use tds_core::{MonitoringSession, RandomSource, SessionConfig};

/// Build a session from the configured settings.
///
/// A seed makes the simulated readings reproducible.
pub(crate) fn build_session(config: SessionConfig, seed: Option<u64>) -> Result<MonitoringSession> {
    let builder = MonitoringSession::builder().config(config);
    let builder = match seed {
        Some(seed) => builder.source(RandomSource::seeded(seed)),
        None => builder,
    };
    Ok(builder.build()?)
}

/// Override the sampling interval of a session configuration.
pub(crate) fn with_interval(mut config: SessionConfig, interval_ms: Option<u64>) -> SessionConfig {
    if let Some(ms) = interval_ms {
        config.sampling_interval = Duration::from_millis(ms);
    }
    config
}
