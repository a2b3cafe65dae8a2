//! Reading CSV files with the collection column layout
//!
//! Lets a CSV export (or a hand-made sheet saved as CSV) be imported back
//! into a collection.

use std::path::Path;

use crate::models::Card;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::rows::{cards_from_table, LoadReport};

/// Read a CSV file whose first record is the header row
pub fn read_csv(path: &Path) -> StorageResult<(Vec<Card>, LoadReport)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::None)
        .from_path(path)
        .map_err(|e| csv_error(e, path))?;

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(e, path))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(e, path))?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    cards_from_table(path, &header, rows, 1)
}

fn csv_error(error: csv::Error, path: &Path) -> StorageError {
    if !error.is_io_error() {
        return StorageError::Csv(error);
    }
    match error.into_kind() {
        csv::ErrorKind::Io(io) => StorageError::from_read(io, path.to_path_buf()),
        kind => StorageError::InvalidFormat {
            path: path.to_path_buf(),
            details: format!("{:?}", kind),
        },
    }
}
