//! Config command handlers

use std::path::Path;

use anyhow::{bail, Context, Result};

use notekeep_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "database": config.sqlite_path(),
                    "remote_url": config.remote_url,
                    "remote_timeout_secs": config.remote_timeout_secs
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir:            {}", config.data_dir.display());
            println!(
                "  remote_url:          {}",
                config.remote_url.as_deref().unwrap_or("(not set)")
            );
            println!("  remote_timeout_secs: {}", config.remote_timeout_secs);
            println!();
            println!("Database:    {}", config.sqlite_path().display());
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
///
/// Only the config file is rewritten; `NOTEKEEP_*` overrides in the current
/// environment are not persisted.
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    set_in_file(&Config::config_file_path(), &key, &value)?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn set_in_file(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut config = Config::read_file(path).context("Failed to load configuration")?;

    apply(&mut config, key, value)?;

    config
        .save_to_path(path)
        .context("Failed to save configuration")
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            if value.is_empty() {
                bail!("data_dir cannot be empty");
            }
            config.data_dir = value.into();
        }
        "remote_url" => {
            config.remote_url = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.to_string())
            };
        }
        "remote_timeout_secs" => {
            let secs: u64 = value
                .parse()
                .context("Invalid value for remote_timeout_secs. Use a whole number of seconds.")?;
            if secs == 0 {
                bail!("remote_timeout_secs must be at least 1");
            }
            config.remote_timeout_secs = secs;
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, remote_url, remote_timeout_secs",
                key
            );
        }
    }
    Ok(())
}
