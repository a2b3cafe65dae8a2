//! Storage layer
//!
//! Handles the collection file and the tabular formats around it.
//!
//! ## Layout
//!
//! - `spreadsheet`: `.xlsx` load/save of the whole collection
//! - `csv_file`: reading CSV files with the same columns (import)
//! - `schema`: the fixed column set shared by every format
//! - `rows`: row validation and load reports
//! - `atomic`: write-then-rename used for every file this crate writes

pub mod atomic;
pub mod csv_file;
pub mod error;
pub mod rows;
pub mod schema;
pub mod spreadsheet;

use std::path::Path;

pub use atomic::atomic_write;
pub use error::{StorageError, StorageResult};
pub use rows::{LoadReport, LoadStatus, RowWarning};
pub use schema::{CardRow, COLUMNS};
pub use spreadsheet::SpreadsheetPersistence;

use crate::models::Card;

/// Read any supported table (`.xlsx` or `.csv`) into cards
///
/// The format is picked by file extension; anything that is not `.csv` is
/// treated as a workbook.
pub fn read_table(path: &Path) -> StorageResult<(Vec<Card>, LoadReport)> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if !path.exists() {
        return Err(StorageError::NotFound {
            path: path.to_path_buf(),
        });
    }

    if is_csv {
        csv_file::read_csv(path)
    } else {
        spreadsheet::read_workbook(path)
    }
}
