//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tds_core::Period;

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Reusable meter connection arguments
#[derive(Debug, Clone, Args)]
pub struct PortArgs {
    /// Serial port of the meter, or use TDS_PORT env var
    #[arg(short, long, env = "TDS_PORT")]
    pub port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Seed for reproducible simulated readings
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Reusable output format arguments
#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Omit header row in CSV output (useful for appending)
    #[arg(long)]
    pub no_header: bool,
}

#[derive(Parser)]
#[command(name = "tds")]
#[command(author, version, about = "Monitor for TDS water-quality meters", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Show temperatures in Fahrenheit (overrides config)
    #[arg(long, global = true)]
    pub fahrenheit: bool,

    /// Configuration file to use instead of the default location
    #[arg(long, global = true, env = "TDS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect, take one reading, and disconnect
    Read {
        #[command(flatten)]
        port: PortArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Continuously monitor a meter
    Watch {
        #[command(flatten)]
        port: PortArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Sampling interval in milliseconds (defaults to the configured interval)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Number of readings to take before exiting (0 for unlimited)
        #[arg(short = 'n', long, default_value = "0")]
        count: u32,

        /// Export the collected history on exit (.csv or .json). Without a
        /// path, writes tds-readings-<date>.csv in the current directory
        #[arg(short, long, num_args = 0..=1, value_name = "PATH")]
        export: Option<Option<PathBuf>>,

        /// Period covered by the summary statistics (1h, 6h, 24h, 7d, 30d)
        #[arg(long, default_value = "24h")]
        period: Period,
    },

    /// Calibrate the meter and save the coefficients
    Calibrate {
        #[command(flatten)]
        port: PortArgs,

        /// Offset added to every raw value (ppm)
        #[arg(long, allow_hyphen_values = true)]
        offset: Option<f64>,

        /// Multiplier applied to every raw value
        #[arg(long)]
        slope: Option<f64>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Configuration subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Restore default settings (keeps port preferences)
    Reset,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. port, data_retention, alerts.high_tds)
        key: String,
        /// Configuration value
        value: String,
    },
}
