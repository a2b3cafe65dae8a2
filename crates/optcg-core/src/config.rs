//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/optcg/config.toml)
//! 3. Environment variables (OPTCG_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::storage::atomic_write;

/// Environment variable prefix
const ENV_PREFIX: &str = "OPTCG";

/// Default collection file name
pub const DEFAULT_COLLECTION_FILE: &str = "one_piece_cards.xlsx";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the collection file
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Explicit collection file; defaults to `one_piece_cards.xlsx` in `data_dir`
    #[serde(default)]
    pub collection_file: Option<PathBuf>,

    /// Save after every change
    #[serde(default = "default_true")]
    pub autosave: bool,

    /// Require card numbers like `OP01-001` when adding or editing
    #[serde(default = "default_true")]
    pub strict_card_numbers: bool,

    /// Write logs to this file instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            collection_file: None,
            autosave: true,
            strict_card_numbers: true,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (OPTCG_DATA_DIR, OPTCG_COLLECTION, OPTCG_AUTOSAVE)
    /// 2. Config file (~/.config/optcg/config.toml or OPTCG_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load from the path given on the command line, if any
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // OPTCG_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // OPTCG_COLLECTION
        if let Ok(val) = std::env::var(format!("{}_COLLECTION", ENV_PREFIX)) {
            self.collection_file = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }

        // OPTCG_AUTOSAVE
        if let Ok(val) = std::env::var(format!("{}_AUTOSAVE", ENV_PREFIX)) {
            self.autosave = val.eq_ignore_ascii_case("true") || val == "1";
        }
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        atomic_write(path, content.as_bytes())
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with OPTCG_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("optcg")
            .join("config.toml")
    }

    /// Get the path to the collection spreadsheet
    pub fn collection_path(&self) -> PathBuf {
        match &self.collection_file {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.data_dir.join(path),
            None => self.data_dir.join(DEFAULT_COLLECTION_FILE),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("optcg")
}
