//! Output formatting utilities for text, JSON, and CSV output.

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use tds_core::{Alert, HistoryStats, Period, Quality, Reading, TemperatureUnit};
use time::format_description::well_known::Rfc3339;

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Unit for temperatures.
    pub unit: TemperatureUnit,
    /// Omit header row in CSV output.
    pub no_header: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool, unit: TemperatureUnit) -> Self {
        Self {
            no_color,
            unit,
            no_header: false,
        }
    }

    /// Create with no_header option for CSV output.
    pub fn with_no_header(mut self, no_header: bool) -> Self {
        self.no_header = no_header;
        self
    }

    /// Format temperature with unit.
    #[must_use]
    pub fn format_temp(&self, celsius: f64) -> String {
        format!("{:.1}{}", self.unit.convert(celsius), self.unit.symbol())
    }
}

fn format_timestamp(reading: &Reading) -> String {
    reading
        .timestamp()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "???".to_string())
}

/// Format quality band with color
#[must_use]
pub fn format_quality(quality: Quality, no_color: bool) -> String {
    let label = quality.as_str().to_uppercase();
    if no_color {
        format!("[{}]", label)
    } else {
        match quality {
            Quality::Excellent => format!("[{}]", label.green()),
            Quality::Good => format!("[{}]", label.cyan()),
            Quality::Fair => format!("[{}]", label.yellow()),
            Quality::Poor => format!("[{}]", label.red()),
        }
    }
}

// ============================================================================
// Reading formatting
// ============================================================================

/// Multi-line description of one reading.
#[must_use]
pub fn format_reading_text(reading: &Reading, opts: &FormatOptions) -> String {
    let quality = reading.quality();
    let mut out = String::new();
    out.push_str(&format!(
        "TDS:          {:.1} ppm  {}\n",
        reading.value(),
        format_quality(quality, opts.no_color)
    ));
    out.push_str(&format!(
        "Temperature:  {}\n",
        opts.format_temp(reading.temperature())
    ));
    out.push_str(&format!("Quality:      {}\n", quality.description()));
    out.push_str(&format!("Action:       {}\n", quality.action()));
    out.push_str(&format!("Time:         {}\n", format_timestamp(reading)));
    out
}

#[derive(Serialize)]
struct ReadingJson<'a> {
    id: String,
    timestamp: String,
    tds_ppm: f64,
    temperature: f64,
    temperature_unit: TemperatureUnit,
    quality: Quality,
    description: &'a str,
}

/// One reading as a single-line JSON object.
pub fn format_reading_json(reading: &Reading, opts: &FormatOptions) -> Result<String> {
    let json = ReadingJson {
        id: reading.id().to_string(),
        timestamp: format_timestamp(reading),
        tds_ppm: reading.value(),
        temperature: opts.unit.convert(reading.temperature()),
        temperature_unit: opts.unit,
        quality: reading.quality(),
        description: reading.quality().description(),
    };
    Ok(serde_json::to_string(&json)? + "\n")
}

/// CSV header matching [`format_csv_line`].
#[must_use]
pub fn format_csv_header(opts: &FormatOptions) -> String {
    format!(
        "Timestamp,TDS (ppm),Temperature ({}),Quality\n",
        opts.unit.symbol()
    )
}

/// One reading as a CSV line.
#[must_use]
pub fn format_csv_line(reading: &Reading, opts: &FormatOptions) -> String {
    format!(
        "{},{},{},{}\n",
        format_timestamp(reading),
        reading.value(),
        opts.unit.convert(reading.temperature()),
        reading.quality().as_str()
    )
}

/// One-line summary used by `watch`.
#[must_use]
pub fn format_watch_line(reading: &Reading, opts: &FormatOptions) -> String {
    format!(
        "{}  {:>7.1} ppm  {}  {}\n",
        format_timestamp(reading),
        reading.value(),
        opts.format_temp(reading.temperature()),
        format_quality(reading.quality(), opts.no_color)
    )
}

/// Alert message for stderr.
#[must_use]
pub fn format_alert(alert: &Alert, opts: &FormatOptions) -> String {
    let message = match alert {
        Alert::TemperatureHigh { value, threshold } => format!(
            "Temperature {} exceeds {}",
            opts.format_temp(*value),
            opts.format_temp(*threshold)
        ),
        Alert::TemperatureLow { value, threshold } => format!(
            "Temperature {} is below {}",
            opts.format_temp(*value),
            opts.format_temp(*threshold)
        ),
        other => other.to_string(),
    };
    if opts.no_color {
        format!("ALERT: {}", message)
    } else {
        format!("{} {}", "ALERT:".red().bold(), message)
    }
}

// ============================================================================
// Statistics formatting
// ============================================================================

/// Summary statistics for a period, or a note when there is nothing to summarise.
#[must_use]
pub fn format_stats_text(stats: Option<&HistoryStats>, period: Period, opts: &FormatOptions) -> String {
    let Some(stats) = stats else {
        return format!("No readings in the last {}\n", period);
    };
    let mut out = format!("Statistics ({} readings, last {})\n", stats.count, period);
    out.push_str(&format!(
        "  TDS:          avg {:.1}  min {:.1}  max {:.1} ppm\n",
        stats.avg_tds, stats.min_tds, stats.max_tds
    ));
    out.push_str(&format!(
        "  Temperature:  avg {}  min {}  max {}\n",
        opts.format_temp(stats.avg_temp),
        opts.format_temp(stats.min_temp),
        opts.format_temp(stats.max_temp)
    ));
    out
}
