//! Turning tabular rows into validated cards
//!
//! Shared by the spreadsheet loader and CSV import. Bad rows never abort a
//! load: they are skipped and collected as [`RowWarning`]s.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::models::Card;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::schema::{is_blank_row, ColumnMap};

/// A row that was skipped while loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowWarning {
    /// 1-based row number as shown by spreadsheet programs
    pub row: usize,
    pub error: ValidationError,
}

impl fmt::Display for RowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.error)
    }
}

/// Whether a backing file was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// File read; `rows` cards accepted
    Loaded { rows: usize },
    /// No file yet; the caller should pick a save location
    Missing,
}

/// Outcome of reading a collection file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub path: PathBuf,
    pub status: LoadStatus,
    pub warnings: Vec<RowWarning>,
}

impl LoadReport {
    pub fn missing(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            status: LoadStatus::Missing,
            warnings: Vec::new(),
        }
    }

    pub fn is_missing(&self) -> bool {
        self.status == LoadStatus::Missing
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Validate every data row of a table whose first row is the header
///
/// `first_row` is the sheet row number of the header (1-based), used to
/// number warnings. Blank rows are skipped silently. Repeated ids (rows
/// copied by hand) get fresh ids so that identifiers stay unique.
pub(crate) fn cards_from_table<I>(
    path: &Path,
    header: &[String],
    rows: I,
    first_row: usize,
) -> StorageResult<(Vec<Card>, LoadReport)>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let map = ColumnMap::from_headers(header.iter().map(String::as_str)).map_err(|missing| {
        StorageError::InvalidFormat {
            path: path.to_path_buf(),
            details: format!("missing column(s): {}", missing.join(", ")),
        }
    })?;

    let mut cards = Vec::new();
    let mut warnings = Vec::new();
    let mut seen_ids = HashSet::new();

    for (offset, row) in rows.into_iter().enumerate() {
        let row_number = first_row + offset + 1;
        if is_blank_row(&row) {
            continue;
        }

        match map.to_input(&row).validate() {
            Ok(mut card) => {
                if !seen_ids.insert(card.id) {
                    debug!("Row {} repeats id {}, assigning a new one", row_number, card.id);
                    card.id = Uuid::new_v4();
                    seen_ids.insert(card.id);
                }
                cards.push(card);
            }
            Err(error) => {
                warn!("Skipping row {} of {:?}: {}", row_number, path, error);
                warnings.push(RowWarning {
                    row: row_number,
                    error,
                });
            }
        }
    }

    let report = LoadReport {
        path: path.to_path_buf(),
        status: LoadStatus::Loaded { rows: cards.len() },
        warnings,
    };
    Ok((cards, report))
}
