//! Read command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::cli::{OutputFormat, PortArgs};
use crate::config::{Config, resolve_baud, resolve_port, update_last_port};
use crate::format::{
    FormatOptions, format_csv_header, format_csv_line, format_reading_json, format_reading_text,
};
use crate::util::write_output;

use super::build_session;

/// Connect, take the connection reading, and disconnect.
pub async fn cmd_read(
    args: PortArgs,
    format: OutputFormat,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
    config: &mut Config,
    config_path: &Path,
) -> Result<()> {
    let port = resolve_port(args.port, config);
    let baud = resolve_baud(args.baud, config);

    let session = build_session(config.settings.session_config(), args.seed)?;
    session
        .connect(&port, baud)
        .await
        .with_context(|| format!("Failed to connect to meter on {}", port))?;

    let reading = session
        .last_reading()
        .context("Meter returned no reading")?;
    session.disconnect().await?;

    let content = match format {
        OutputFormat::Json => format_reading_json(&reading, opts)?,
        OutputFormat::Csv => {
            let mut out = String::new();
            if !opts.no_header {
                out.push_str(&format_csv_header(opts));
            }
            out.push_str(&format_csv_line(&reading, opts));
            out
        }
        OutputFormat::Text => format_reading_text(&reading, opts),
    };
    write_output(output, &content)?;

    if let Err(e) = update_last_port(config_path, config, &port) {
        debug!("Could not remember last port: {:#}", e);
    }
    Ok(())
}
