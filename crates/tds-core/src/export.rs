//! CSV and JSON export of reading history.
//!
//! Records are written in the order given, which for session history is
//! most-recent-first. Timestamps are RFC 3339 in UTC.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};
use tracing::info;

use tds_types::Reading;

use crate::error::{Error, Result};

/// Header row of CSV exports.
pub const CSV_HEADER: &str = "Timestamp,TDS (ppm),Temperature (°C),Quality";

/// Export file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// Guess the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(Error::InvalidConfig(format!(
                "unknown export format '{}': expected csv or json",
                s
            ))),
        }
    }
}

/// Default export file name for a date, e.g. `tds-readings-2024-06-10.csv`.
pub fn export_filename(date: Date, format: ExportFormat) -> String {
    format!(
        "tds-readings-{:04}-{:02}-{:02}.{}",
        date.year(),
        u8::from(date.month()),
        date.day(),
        format.extension()
    )
}

fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_default()
}

/// One CSV row for a reading, without a trailing newline.
pub fn csv_row(reading: &Reading) -> String {
    format!(
        "{},{},{},{}",
        format_timestamp(reading.timestamp()),
        reading.value(),
        reading.temperature(),
        reading.quality().as_str()
    )
}

/// Render readings as CSV, header first.
pub fn to_csv(readings: &[Reading]) -> String {
    let mut out = String::with_capacity(64 * (readings.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');
    for reading in readings {
        out.push_str(&csv_row(reading));
        out.push('\n');
    }
    out
}

#[derive(Serialize)]
struct JsonExport<'a> {
    #[serde(with = "time::serde::rfc3339")]
    exported_at: OffsetDateTime,
    record_count: usize,
    records: &'a [Reading],
}

/// Render readings as a pretty-printed JSON document.
pub fn to_json(readings: &[Reading], exported_at: OffsetDateTime) -> Result<String> {
    let doc = JsonExport {
        exported_at,
        record_count: readings.len(),
        records: readings,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Write readings to `path` in the given format.
pub fn write_file(readings: &[Reading], path: &Path, format: ExportFormat) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    match format {
        ExportFormat::Csv => writer.write_all(to_csv(readings).as_bytes())?,
        ExportFormat::Json => {
            let json = to_json(readings, OffsetDateTime::now_utc())?;
            writer.write_all(json.as_bytes())?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;
    info!("Exported {} readings to {}", readings.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use time::macros::{date, datetime};

    fn sample_readings() -> Vec<Reading> {
        vec![
            Reading::new(312.5, 24.25, datetime!(2024-06-10 12:00:02 UTC)),
            Reading::new(42.0, 22.0, datetime!(2024-06-10 12:00:00 UTC)),
        ]
    }

    #[test]
    fn test_csv_header_and_rows() {
        let csv = to_csv(&sample_readings());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Timestamp,TDS (ppm),Temperature (°C),Quality",
                "2024-06-10T12:00:02Z,312.5,24.25,poor",
                "2024-06-10T12:00:00Z,42,22,excellent",
            ]
        );
    }

    #[test]
    fn test_csv_empty() {
        assert_eq!(to_csv(&[]), format!("{}\n", CSV_HEADER));
    }

    #[test]
    fn test_json_document() {
        let readings = sample_readings();
        let json = to_json(&readings, datetime!(2024-06-10 13:00:00 UTC)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["exported_at"], "2024-06-10T13:00:00Z");
        assert_eq!(value["record_count"], 2);
        assert_eq!(value["records"][0]["value"], 312.5);
        assert_eq!(value["records"][0]["quality"], "poor");
        assert_eq!(value["records"][1]["timestamp"], "2024-06-10T12:00:00Z");
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(
            export_filename(date!(2024 - 06 - 10), ExportFormat::Csv),
            "tds-readings-2024-06-10.csv"
        );
        assert_eq!(
            export_filename(date!(2025 - 01 - 02), ExportFormat::Json),
            "tds-readings-2025-01-02.json"
        );
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ExportFormat::from_path(Path::new("out/readings.JSON")),
            Some(ExportFormat::Json)
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("readings.csv")),
            Some(ExportFormat::Csv)
        );
        assert_eq!(ExportFormat::from_path(Path::new("readings.txt")), None);
        assert_eq!(ExportFormat::from_path(Path::new("readings")), None);
    }

    #[test]
    fn test_write_file() {
        let dir = tempdir().unwrap();
        let readings = sample_readings();

        let csv_path = dir.path().join("history.csv");
        write_file(&readings, &csv_path, ExportFormat::Csv).unwrap();
        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(content, to_csv(&readings));

        let json_path = dir.path().join("history.json");
        write_file(&readings, &json_path, ExportFormat::Json).unwrap();
        let content = std::fs::read_to_string(&json_path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["record_count"], 2);
    }

    #[test]
    fn test_write_file_to_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("history.csv");
        let err = write_file(&sample_readings(), &path, ExportFormat::Csv).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
