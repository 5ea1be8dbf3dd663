use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tds_core::TemperatureUnit;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod format;
mod util;

use cli::{Cli, Commands, ConfigAction};
use commands::{CalibrateArgs, WatchArgs, cmd_calibrate, cmd_config, cmd_read, cmd_watch};
use config::Config;
use format::FormatOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "tds", &mut io::stdout());
        return Ok(());
    }

    // Logs go to stderr so they never mix with command output.
    let filter = if cli.quiet {
        EnvFilter::new("error")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config_path = Config::resolve_path(cli.config.as_deref());
    let mut config = match Config::load(&config_path) {
        Ok(config) => config,
        // A broken file can still be replaced or reset.
        Err(e)
            if matches!(
                cli.command,
                Commands::Config {
                    action: ConfigAction::Init { force: true } | ConfigAction::Reset
                }
            ) =>
        {
            warn!("Ignoring unreadable config: {:#}", e);
            Config::default()
        }
        Err(e) => return Err(e),
    };

    let unit = if cli.fahrenheit {
        TemperatureUnit::Fahrenheit
    } else {
        config.settings.temperature_unit
    };
    let opts = FormatOptions::new(cli.no_color || config.no_color, unit);
    let output = cli.output.as_ref();

    match cli.command {
        Commands::Read { port, output: out } => {
            let opts = opts.with_no_header(out.no_header);
            cmd_read(port, out.format, output, &opts, &mut config, &config_path).await?;
        }
        Commands::Watch {
            port,
            output: out,
            interval,
            count,
            export,
            period,
        } => {
            let opts = opts.with_no_header(out.no_header);
            cmd_watch(
                WatchArgs {
                    port,
                    interval,
                    count,
                    format: out.format,
                    output,
                    export,
                    period,
                    quiet: cli.quiet,
                    opts: &opts,
                },
                &mut config,
                &config_path,
            )
            .await?;
        }
        Commands::Calibrate {
            port,
            offset,
            slope,
        } => {
            cmd_calibrate(
                CalibrateArgs {
                    port,
                    offset,
                    slope,
                },
                &mut config,
                &config_path,
            )
            .await?;
        }
        Commands::Config { action } => {
            cmd_config(action, &mut config, &config_path)?;
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
