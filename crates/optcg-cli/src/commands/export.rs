//! Export command handler

use std::path::PathBuf;

use anyhow::{Context, Result};

use optcg_core::{ExportFormat, Filter, Store};

use crate::output::Output;

/// Default export name, next to the collection file
const DEFAULT_EXPORT_STEM: &str = "exported_one_piece_cards";

/// Export the cards matching a filter
///
/// The format comes from `--format`, then the file extension, then CSV.
pub fn export(
    store: &Store,
    path: Option<PathBuf>,
    format: Option<ExportFormat>,
    filter: &Filter,
    output: &Output,
) -> Result<()> {
    let format = format
        .or_else(|| path.as_deref().and_then(ExportFormat::from_path))
        .unwrap_or(ExportFormat::Csv);

    let path = match path {
        Some(p) => format.with_extension(&p),
        None => {
            let dir = store
                .path()
                .parent()
                .map(PathBuf::from)
                .unwrap_or_default();
            format.with_extension(&dir.join(DEFAULT_EXPORT_STEM))
        }
    };

    let count = store
        .export(filter, format, &path)
        .with_context(|| format!("Failed to export to {}", path.display()))?;

    output.success(&format!(
        "Exported {} card(s) as {} to {}",
        count,
        format.extension().to_uppercase(),
        path.display()
    ));
    Ok(())
}
