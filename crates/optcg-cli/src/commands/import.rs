//! Import command handler

use std::path::Path;

use anyhow::{Context, Result};

use optcg_core::{DuplicatePolicy, Store};

use crate::args::PolicyArgs;
use crate::output::Output;

/// Merge the rows of an `.xlsx` or `.csv` file into the collection
///
/// Imports never prompt per row; without a flag, matching rows are merged.
pub fn import(store: &mut Store, path: &Path, policy: PolicyArgs, output: &Output) -> Result<()> {
    let policy = policy.policy().unwrap_or(DuplicatePolicy::Merge);

    let summary = store
        .import(path, policy)
        .with_context(|| format!("Failed to import {}", path.display()))?;

    output.warn_rows(&summary.warnings);
    output.success(&format!(
        "Imported {}: {} added, {} merged, {} skipped",
        path.display(),
        summary.added,
        summary.merged,
        summary.warnings.len()
    ));
    Ok(())
}
