//! Config command implementation.

use std::path::Path;

use anyhow::{Result, bail};
use tds_core::settings::KEYS;

use crate::cli::ConfigAction;
use crate::config::{CLI_KEYS, Config};

pub fn cmd_config(action: ConfigAction, config: &mut Config, path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(config)?);
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                bail!(
                    "Config file already exists: {} (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save(path)?;
            println!("Created config file: {}", path.display());
        }
        ConfigAction::Reset => {
            config.settings.reset();
            config.save(path)?;
            println!("Restored default settings in {}", path.display());
        }
        ConfigAction::Set { key, value } => {
            if !CLI_KEYS.contains(&key.as_str()) && !KEYS.contains(&key.as_str()) {
                bail!(
                    "Unknown key: {}. Valid keys: {}, {}",
                    key,
                    CLI_KEYS.join(", "),
                    KEYS.join(", ")
                );
            }
            config.set(&key, &value)?;
            config.save(path)?;
            println!("Set {} = {}", key, value);
        }
    }
    Ok(())
}
