//! Watch command implementation.
//!
//! Runs a monitoring session and prints every reading as it arrives on the
//! event channel. Alerts go to stderr so they never mix with CSV or JSON
//! output.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use tds_core::export::{self, ExportFormat};
use tds_core::{Period, SessionEvent};
use time::{Date, OffsetDateTime};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::cli::{OutputFormat, PortArgs};
use crate::config::{Config, resolve_baud, resolve_port, update_last_port};
use crate::format::{
    FormatOptions, format_alert, format_csv_header, format_csv_line, format_reading_json,
    format_stats_text, format_watch_line,
};
use crate::util::{append_output, write_output};

use super::{build_session, with_interval};

/// Arguments for the watch command.
pub struct WatchArgs<'a> {
    pub port: PortArgs,
    pub interval: Option<u64>,
    pub count: u32,
    pub format: OutputFormat,
    pub output: Option<&'a PathBuf>,
    /// `Some(None)` exports to the default dated file name.
    pub export: Option<Option<PathBuf>>,
    pub period: Period,
    pub quiet: bool,
    pub opts: &'a FormatOptions,
}

pub async fn cmd_watch(args: WatchArgs<'_>, config: &mut Config, config_path: &Path) -> Result<()> {
    let WatchArgs {
        port,
        interval,
        count,
        format,
        output,
        export,
        period,
        quiet,
        opts,
    } = args;

    let port_name = resolve_port(port.port, config);
    let baud = resolve_baud(port.baud, config);
    let session_config = with_interval(config.settings.session_config(), interval);
    let interval_ms = session_config.sampling_interval.as_millis();

    let session = build_session(session_config, port.seed)?;
    // Subscribe first so the reading taken on connect is not missed.
    let mut events = session.subscribe();

    session
        .connect(&port_name, baud)
        .await
        .with_context(|| format!("Failed to connect to meter on {}", port_name))?;
    if let Err(e) = update_last_port(config_path, config, &port_name) {
        debug!("Could not remember last port: {:#}", e);
    }

    if !quiet {
        let header = if opts.no_color {
            format!("Watching: {} ({} baud)", port_name, baud)
        } else {
            format!("Watching: {} ({} baud)", port_name.cyan(), baud)
        };
        eprintln!("{}", header);
        if count > 0 {
            eprintln!(
                "Interval: {}ms | Count: {} | Press Ctrl+C to stop",
                interval_ms, count
            );
        } else {
            eprintln!("Interval: {}ms | Press Ctrl+C to stop", interval_ms);
        }
        eprintln!("{}", "-".repeat(50));
    }

    session.start_monitoring().await?;

    let mut readings_taken: u32 = 0;
    let mut header_written = opts.no_header;
    let mut output_started = false;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                eprintln!("\nShutting down...");
                break;
            }
            event = events.recv() => match event {
                Ok(SessionEvent::Reading { reading }) => {
                    readings_taken += 1;
                    let content = match format {
                        OutputFormat::Json => format_reading_json(&reading, opts)?,
                        OutputFormat::Csv => {
                            let mut out = String::new();
                            if !header_written {
                                out.push_str(&format_csv_header(opts));
                                header_written = true;
                            }
                            out.push_str(&format_csv_line(&reading, opts));
                            out
                        }
                        OutputFormat::Text => format_watch_line(&reading, opts),
                    };
                    if output_started {
                        append_output(output, &content)?;
                    } else {
                        write_output(output, &content)?;
                        output_started = true;
                    }

                    if count > 0 && readings_taken >= count {
                        if !quiet {
                            eprintln!("Completed {} readings.", readings_taken);
                        }
                        break;
                    }
                }
                Ok(SessionEvent::Alert { alert }) => {
                    eprintln!("{}", format_alert(&alert, opts));
                }
                Ok(other) => debug!("Session event: {:?}", other),
                Err(RecvError::Lagged(missed)) => {
                    warn!("Output fell behind, skipped {} events", missed);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    session.stop_monitoring().await;

    if !quiet {
        eprint!("{}", format_stats_text(session.stats(period).as_ref(), period, opts));
    }

    if let Some(path) = export {
        let path = path.unwrap_or_else(|| default_export_path(OffsetDateTime::now_utc().date()));
        let export_format = ExportFormat::from_path(&path).unwrap_or_default();
        let readings = session.readings();
        export::write_file(&readings, &path, export_format)
            .with_context(|| format!("Failed to export readings to {}", path.display()))?;
        if !quiet {
            eprintln!(
                "Exported {} readings to {} ({})",
                readings.len(),
                path.display(),
                export_format
            );
        }
    }

    session.disconnect().await?;
    Ok(())
}

fn default_export_path(date: Date) -> PathBuf {
    PathBuf::from(export::export_filename(date, ExportFormat::Csv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_default_export_path() {
        assert_eq!(
            default_export_path(date!(2024 - 06 - 10)),
            PathBuf::from("tds-readings-2024-06-10.csv")
        );
    }
}
