//! Save command handler

use std::path::PathBuf;

use anyhow::{Context, Result};

use optcg_core::Store;

use crate::output::Output;

/// Write the collection now, optionally to a new location
///
/// With a path, the collection is saved there and the configuration is
/// updated so later commands use the new file.
pub fn save(
    store: &mut Store,
    path: Option<PathBuf>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match path {
        None => {
            store.flush().context("Failed to save collection")?;
            output.success(&format!(
                "Saved {} card(s) to {}",
                store.len(),
                store.path().display()
            ));
        }
        Some(path) => {
            let path = if path.extension().is_none() {
                path.with_extension("xlsx")
            } else {
                path
            };
            let path = std::path::absolute(&path).unwrap_or(path);
            store
                .save_as(&path)
                .with_context(|| format!("Failed to save collection to {}", path.display()))?;

            let mut config = store.config().clone();
            config.collection_file = Some(path.clone());
            let config_file = config_path
                .cloned()
                .unwrap_or_else(optcg_core::Config::config_file_path);
            config
                .save_to_path(&config_file)
                .context("Failed to save configuration")?;

            output.success(&format!(
                "Saved {} card(s) to {}",
                store.len(),
                path.display()
            ));
        }
    }
    Ok(())
}
