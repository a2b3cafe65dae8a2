//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use optcg_core::Config;

use crate::output::{Output, OutputFormat};

/// Keys accepted by `config set`
const KEYS: &str = "data_dir, collection_file, autosave, strict_card_numbers, log_file";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "collection_file": config.collection_file,
                    "collection_path": config.collection_path(),
                    "autosave": config.autosave,
                    "strict_card_numbers": config.strict_card_numbers,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.collection_path().display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:            {}", config.data_dir.display());
            println!("  collection_file:     {}", display_opt(&config.collection_file));
            println!("  autosave:            {}", config.autosave);
            println!("  strict_card_numbers: {}", config.strict_card_numbers);
            println!("  log_file:            {}", display_opt(&config.log_file));
            println!();
            println!("Collection:  {}", config.collection_path().display());
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

fn display_opt(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(not set)".to_string())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => config.data_dir = value.into(),
        "collection_file" => config.collection_file = optional_path(value),
        "autosave" => {
            config.autosave = value
                .parse()
                .context("Invalid value for autosave. Use 'true' or 'false'.")?;
        }
        "strict_card_numbers" => {
            config.strict_card_numbers = value
                .parse()
                .context("Invalid value for strict_card_numbers. Use 'true' or 'false'.")?;
        }
        "log_file" => config.log_file = optional_path(value),
        _ => {
            bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                KEYS
            );
        }
    }
    Ok(())
}

/// Empty or "none" clears an optional path
fn optional_path(value: &str) -> Option<PathBuf> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();

        apply(&mut config, "collection_file", "binder.xlsx").unwrap();
        assert_eq!(config.collection_file, Some(PathBuf::from("binder.xlsx")));
        apply(&mut config, "collection_file", "none").unwrap();
        assert!(config.collection_file.is_none());

        apply(&mut config, "autosave", "false").unwrap();
        assert!(!config.autosave);
        apply(&mut config, "strict_card_numbers", "false").unwrap();
        assert!(!config.strict_card_numbers);
    }

    #[test]
    fn test_apply_rejects_bad_input() {
        let mut config = Config::default();
        assert!(apply(&mut config, "autosave", "sometimes").is_err());
        assert!(apply(&mut config, "sync_url", "x").is_err());
        assert_eq!(config, Config::default());
    }
}
