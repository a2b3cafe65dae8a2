//! Exporting views
//!
//! Writes a point-in-time snapshot of a view as CSV or JSON. Exports use the
//! collection's column names and the same atomic write as saves, and never
//! touch the collection itself.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::Card;
use crate::storage::schema::{CardRow, COLUMNS};
use crate::storage::{atomic_write, StorageError, StorageResult};

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Header row plus one comma-separated row per card
    Csv,
    /// Pretty-printed array of objects keyed by column name
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }

    /// Append this format's extension unless the path already has it
    pub fn with_extension(&self, path: &Path) -> PathBuf {
        let has_it = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(self.extension()));
        if has_it {
            path.to_path_buf()
        } else {
            let mut name = path.as_os_str().to_os_string();
            name.push(".");
            name.push(self.extension());
            PathBuf::from(name)
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unknown export format '{}' (expected csv or json)", other)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Write `view` to `path`, returning the number of cards written
///
/// On failure the target is left as it was and no partial file remains.
pub fn export(view: &[Card], format: ExportFormat, path: &Path) -> StorageResult<usize> {
    let bytes = render(view, format)?;
    atomic_write(path, &bytes)?;
    info!("Exported {} card(s) as {} to {:?}", view.len(), format, path);
    Ok(view.len())
}

/// Encode `view` without writing it anywhere
pub fn render(view: &[Card], format: ExportFormat) -> StorageResult<Vec<u8>> {
    match format {
        ExportFormat::Csv => render_csv(view),
        ExportFormat::Json => {
            let rows: Vec<CardRow<'_>> = view.iter().map(CardRow::from).collect();
            let mut bytes = serde_json::to_vec_pretty(&rows)?;
            bytes.push(b'\n');
            Ok(bytes)
        }
    }
}

fn render_csv(view: &[Card]) -> StorageResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    // Written by hand so an empty view still gets a header row
    writer.write_record(COLUMNS)?;
    for card in view {
        writer.serialize(CardRow::from(card))?;
    }

    writer
        .into_inner()
        .map_err(|e| StorageError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn view() -> Vec<Card> {
        let mut luffy = Card::new("OP01-001", "Luffy", 2);
        luffy.notes = Some("Top-loader, \"near mint\"".into());
        luffy.alt_art = true;
        vec![luffy, Card::new("OP01-025", "Zoro", 1)]
    }

    #[test]
    fn test_csv_export() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.csv");
        let view = view();

        assert_eq!(export(&view, ExportFormat::Csv, &path).unwrap(), 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<_> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, COLUMNS);

        let records: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][0], "2");
        assert_eq!(&records[0][10], "Top-loader, \"near mint\"");
        assert_eq!(&records[0][8], "true");
        assert_eq!(&records[1][11], view[1].id.to_string());
    }

    #[test]
    fn test_csv_export_empty_view_has_header() {
        let bytes = render(&[], ExportFormat::Csv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("QTY,Card Number,Card Name"));
    }

    #[test]
    fn test_json_export() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.json");

        export(&view(), ExportFormat::Json, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Card Name"], "Luffy");
        assert_eq!(rows[0]["QTY"], 2);
        assert_eq!(rows[0]["Alt Art"], true);
        assert!(rows[1]["Notes"].is_null());
    }

    #[test]
    fn test_export_to_unwritable_path_fails_cleanly() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        // Parent is a regular file, so the directory cannot be created
        let path = blocker.join("out.csv");

        assert!(export(&view(), ExportFormat::Csv, &path).is_err());
        assert_eq!(std::fs::read(&blocker).unwrap(), b"x");
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xml".parse::<ExportFormat>().is_err());
        assert_eq!(
            ExportFormat::from_path(Path::new("cards.CSV")),
            Some(ExportFormat::Csv)
        );
        assert_eq!(
            ExportFormat::Csv.with_extension(Path::new("exported_one_piece_cards")),
            PathBuf::from("exported_one_piece_cards.csv")
        );
        assert_eq!(
            ExportFormat::Json.with_extension(Path::new("a/cards.json")),
            PathBuf::from("a/cards.json")
        );
    }
}
