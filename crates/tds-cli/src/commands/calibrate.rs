//! Calibrate command implementation.

use std::path::Path;

use anyhow::{Context, Result, bail};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;

use crate::cli::PortArgs;
use crate::config::{Config, resolve_baud, resolve_port, update_last_port};

use super::build_session;

/// Arguments for the calibrate command.
pub struct CalibrateArgs {
    pub port: PortArgs,
    pub offset: Option<f64>,
    pub slope: Option<f64>,
}

/// Check the meter is reachable, then store new calibration coefficients.
///
/// Coefficients that are not given keep their current value.
pub async fn cmd_calibrate(args: CalibrateArgs, config: &mut Config, config_path: &Path) -> Result<()> {
    let port = resolve_port(args.port.port, config);
    let baud = resolve_baud(args.port.baud, config);

    let session = build_session(config.settings.session_config(), args.port.seed)?;
    session
        .connect(&port, baud)
        .await
        .with_context(|| format!("Cannot calibrate: meter on {} is not reachable", port))?;
    session.disconnect().await?;

    let mut calibration = config.settings.calibration;
    if let Some(offset) = args.offset {
        calibration.offset = offset;
    }
    if let Some(slope) = args.slope {
        calibration.slope = slope;
    }
    let problems = calibration.problems();
    if !problems.is_empty() {
        bail!("Invalid calibration: {}", problems.join("; "));
    }

    let now = OffsetDateTime::now_utc();
    calibration.mark_calibrated(now);
    config.settings.calibration = calibration;
    config.last_port = Some(port.clone());
    config.save(config_path)?;
    info!(
        "Calibrated meter on {}: offset {}, slope {}",
        port, calibration.offset, calibration.slope
    );

    println!("Calibrated meter on {}", port);
    println!("  Offset:  {:+.2} ppm", calibration.offset);
    println!("  Slope:   {:.3}", calibration.slope);
    println!(
        "  Date:    {}",
        now.format(&Rfc3339).unwrap_or_else(|_| "???".to_string())
    );
    Ok(())
}
