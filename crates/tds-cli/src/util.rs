//! Shared utilities for CLI commands.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Write output to file (replacing it) or stdout.
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}

/// Append output to file or write to stdout.
pub fn append_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            file.write_all(content.as_bytes())
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_output_replaces_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_output(Some(&path), "first\n").unwrap();
        write_output(Some(&path), "second\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");
    }

    #[test]
    fn test_append_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_output(Some(&path), "header\n").unwrap();
        append_output(Some(&path), "a\n").unwrap();
        append_output(Some(&path), "b\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "header\na\nb\n");
    }

    #[test]
    fn test_write_output_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");
        let err = write_output(Some(&path), "x").unwrap_err();
        assert!(err.to_string().contains("Failed to write to"));
    }
}
