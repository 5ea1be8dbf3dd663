//! Configuration file management.
//!
//! The CLI keeps its own preferences (default port, colours) next to the
//! monitoring [`Settings`] in a single TOML file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tds_core::Settings;
use tds_types::DEFAULT_BAUD_RATE;

/// Port used when none is given and none is remembered.
pub const DEFAULT_PORT: &str = "COM3";

/// Keys handled by the CLI itself rather than by [`Settings`].
pub const CLI_KEYS: &[&str] = &["port", "baud_rate", "no_color"];

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Default serial port
    #[serde(default)]
    pub port: Option<String>,

    /// Default baud rate
    #[serde(default)]
    pub baud_rate: Option<u32>,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,

    /// Last successfully connected port (auto-updated)
    #[serde(default)]
    pub last_port: Option<String>,

    /// Monitoring settings
    #[serde(default)]
    pub settings: Settings,
}

impl Config {
    /// Default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tds-meter")
            .join("config.toml")
    }

    /// Config file path, honouring an explicit override
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path)
    }

    /// Load config from file, or return default if not found
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config
            .settings
            .validate()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Set a value by key. CLI keys are handled here, the rest by [`Settings::set`].
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "port" => {
                let port = value.trim();
                self.port = (!port.is_empty()).then(|| port.to_string());
            }
            "baud_rate" => {
                let baud: u32 = value
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid baud rate '{}'", value))?;
                anyhow::ensure!(baud > 0, "Baud rate must be greater than 0");
                self.baud_rate = Some(baud);
            }
            "no_color" => {
                self.no_color = parse_bool(value)
                    .with_context(|| format!("Invalid value for no_color: '{}'", value))?;
            }
            _ => {
                self.settings.set(key, value)?;
                self.settings.validate()?;
            }
        }
        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Resolve the port: explicit argument, configured default, remembered port
/// (when auto-connect is enabled), then [`DEFAULT_PORT`].
pub fn resolve_port(port: Option<String>, config: &Config) -> String {
    port.or_else(|| config.port.clone())
        .or_else(|| {
            if config.settings.auto_connect {
                config.last_port.clone()
            } else {
                None
            }
        })
        .unwrap_or_else(|| DEFAULT_PORT.to_string())
}

/// Resolve the baud rate: explicit argument, configured default, then 9600.
pub fn resolve_baud(baud: Option<u32>, config: &Config) -> u32 {
    baud.or(config.baud_rate).unwrap_or(DEFAULT_BAUD_RATE)
}

/// Remember the last connected port. Only writes when it changed.
pub fn update_last_port(path: &Path, config: &mut Config, port: &str) -> Result<()> {
    if config.last_port.as_deref() == Some(port) {
        return Ok(());
    }
    config.last_port = Some(port.to_string());
    config.save(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_port_prefers_arg() {
        let config = Config {
            port: Some("COM1".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_port(Some("COM9".to_string()), &config), "COM9");
    }

    #[test]
    fn test_resolve_port_falls_back_to_config() {
        let config = Config {
            port: Some("COM1".to_string()),
            last_port: Some("COM2".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_port(None, &config), "COM1");
    }

    #[test]
    fn test_resolve_port_uses_last_port_only_with_auto_connect() {
        let mut config = Config {
            last_port: Some("COM2".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_port(None, &config), DEFAULT_PORT);

        config.settings.auto_connect = true;
        assert_eq!(resolve_port(None, &config), "COM2");
    }

    #[test]
    fn test_resolve_baud() {
        let mut config = Config::default();
        assert_eq!(resolve_baud(None, &config), 9600);
        config.baud_rate = Some(19200);
        assert_eq!(resolve_baud(None, &config), 19200);
        assert_eq!(resolve_baud(Some(115_200), &config), 115_200);
    }

    #[test]
    fn test_load_missing_returns_default() {
        let dir = tempdir().unwrap();
        let config = Config::load(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tds").join("config.toml");

        let mut config = Config::default();
        config.set("port", "COM5").unwrap();
        config.set("data_retention", "500").unwrap();
        config.set("alerts.high_tds", "250").unwrap();
        config.save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[settings]"));
        assert!(content.contains("[settings.alerts]"));

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.settings.data_retention, 500);
    }

    #[test]
    fn test_load_rejects_invalid_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[settings]\ndata_retention = 1\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("data_retention"));
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let mut config = Config::default();
        assert!(config.set("baud_rate", "0").is_err());
        assert!(config.set("baud_rate", "fast").is_err());
        assert!(config.set("no_color", "perhaps").is_err());
        assert!(config.set("monitoring_interval_ms", "5").is_err());
        assert!(config.set("unknown", "1").is_err());
    }

    #[test]
    fn test_set_empty_port_clears_it() {
        let mut config = Config::default();
        config.set("port", "COM5").unwrap();
        config.set("port", "").unwrap();
        assert!(config.port.is_none());
    }

    #[test]
    fn test_update_last_port() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();

        update_last_port(&path, &mut config, "COM4").unwrap();
        assert!(path.exists());
        assert_eq!(
            Config::load(&path).unwrap().last_port.as_deref(),
            Some("COM4")
        );
    }
}
