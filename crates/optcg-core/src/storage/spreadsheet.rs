//! Spreadsheet persistence
//!
//! Handles saving and loading the collection to/from a single-worksheet
//! `.xlsx` file. Saves are atomic (write to temp file, then rename).
//!
//! Storage location: `one_piece_cards.xlsx` in the data directory
//! (configurable via `Config`).

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, Reader, Xlsx, XlsxError};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use rust_xlsxwriter::{Format, Workbook};
use tracing::{debug, info};

use crate::models::Card;
use crate::storage::atomic::atomic_write;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::rows::{cards_from_table, LoadReport};
use crate::storage::schema::COLUMNS;

/// Name of the worksheet written on save
pub const SHEET_NAME: &str = "Cards";

/// Excel's escape for characters XML cannot carry, e.g. `_x000D_` for `\r`
static CELL_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_x([0-9A-Fa-f]{4})_").expect("cell escape pattern is valid"));

/// Persistence layer for the collection file
#[derive(Debug, Clone)]
pub struct SpreadsheetPersistence {
    path: PathBuf,
}

impl SpreadsheetPersistence {
    /// Create a persistence handler for the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Point at a different backing file (e.g. after "save as")
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
    }

    /// Check if the collection file exists on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the collection
    ///
    /// A missing file yields an empty collection and
    /// [`LoadStatus::Missing`](crate::storage::LoadStatus::Missing).
    /// Rows that fail validation are skipped and reported in the
    /// [`LoadReport`]; an unreadable workbook is an error.
    pub fn load(&self) -> StorageResult<(Vec<Card>, LoadReport)> {
        if !self.exists() {
            info!("No collection file at {:?}", self.path);
            return Ok((Vec::new(), LoadReport::missing(&self.path)));
        }

        let (cards, report) = read_workbook(&self.path)?;
        info!(
            "Loaded {} card(s) from {:?} ({} row(s) skipped)",
            cards.len(),
            self.path,
            report.warnings.len()
        );
        Ok((cards, report))
    }

    /// Save the whole collection, replacing the file atomically
    pub fn save(&self, cards: &[Card]) -> StorageResult<()> {
        let bytes = write_workbook(cards)?;
        atomic_write(&self.path, &bytes)?;
        debug!("Saved {} card(s) to {:?}", cards.len(), self.path);
        Ok(())
    }
}

/// Read the first worksheet of an `.xlsx` file
pub fn read_workbook(path: &Path) -> StorageResult<(Vec<Card>, LoadReport)> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| xlsx_error(e, path))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        Some(Err(e)) => return Err(xlsx_error(e, path)),
        None => {
            return Err(StorageError::InvalidFormat {
                path: path.to_path_buf(),
                details: "workbook has no worksheets".to_string(),
            })
        }
    };

    let header_row = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
    let mut rows = range
        .rows()
        .map(|cells| cells.iter().map(cell_text).collect::<Vec<_>>());

    let header = rows.next().ok_or_else(|| StorageError::InvalidFormat {
        path: path.to_path_buf(),
        details: "worksheet is empty".to_string(),
    })?;

    cards_from_table(path, &header, rows, header_row)
}

/// Serialize cards into `.xlsx` bytes
pub fn write_workbook(cards: &[Card]) -> StorageResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, title) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header_format)?;
    }

    for (idx, card) in cards.iter().enumerate() {
        let row = (idx + 1) as u32;
        sheet.write_number(row, 0, card.quantity)?;
        let text_cells = [
            (1, card.card_number.as_str()),
            (2, card.name.as_str()),
            (3, card.crew.as_str()),
            (4, card.color.as_str()),
            (5, card.finish.as_str()),
            (6, card.rarity.as_str()),
            (7, card.kind.as_str()),
            (9, card.special_power.as_deref().unwrap_or("")),
            (10, card.notes.as_deref().unwrap_or("")),
        ];
        for (col, text) in text_cells {
            if !text.is_empty() {
                sheet.write_string(row, col, text)?;
            }
        }
        sheet.write_boolean(row, 8, card.alt_art)?;
        sheet.write_string(row, 11, card.id.to_string())?;
    }
    sheet.autofit();

    Ok(workbook.save_to_buffer()?)
}

/// Render a cell the way a user would type it back in
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => unescape_cell(s).into_owned(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Undo the `_xHHHH_` escapes applied when the cell was written
///
/// A literal `_x000D_` is stored as `_x005F_x000D_`; decoding left to right
/// turns the `_x005F_` back into `_` and leaves the rest alone.
fn unescape_cell(text: &str) -> Cow<'_, str> {
    CELL_ESCAPE.replace_all(text, |caps: &Captures| {
        u32::from_str_radix(&caps[1], 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    })
}

fn xlsx_error(error: XlsxError, path: &Path) -> StorageError {
    match error {
        XlsxError::Io(e) => StorageError::from_read(e, path.to_path_buf()),
        other => StorageError::SpreadsheetRead {
            path: path.to_path_buf(),
            details: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::rows::LoadStatus;
    use std::fs;
    use tempfile::TempDir;

    fn sample() -> Vec<Card> {
        let mut luffy = Card::new("OP01-001", "Monkey.D.Luffy", 2);
        luffy.crew = "Straw Hat Crew".into();
        luffy.color = "Red".into();
        luffy.finish = "Foil".into();
        luffy.rarity = "L".into();
        luffy.kind = "Leader".into();
        luffy.alt_art = true;
        luffy.special_power = Some("DON!! x1: +1000 power".into());

        let mut zoro = Card::new("OP01-025", "Roronoa Zoro", 1);
        zoro.rarity = "SR".into();
        zoro.notes = Some("Tournament pack, \"mint\"".into());

        vec![luffy, zoro]
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = SpreadsheetPersistence::new(temp_dir.path().join("cards.xlsx"));

        assert!(!persistence.exists());
        let (cards, report) = persistence.load().unwrap();
        assert!(cards.is_empty());
        assert!(report.is_missing());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = SpreadsheetPersistence::new(temp_dir.path().join("cards.xlsx"));
        let cards = sample();

        persistence.save(&cards).unwrap();
        assert!(persistence.exists());

        let (loaded, report) = persistence.load().unwrap();
        assert_eq!(loaded, cards);
        assert_eq!(report.status, LoadStatus::Loaded { rows: 2 });
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_save_empty_collection_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = SpreadsheetPersistence::new(temp_dir.path().join("cards.xlsx"));

        persistence.save(&[]).unwrap();
        let (loaded, report) = persistence.load().unwrap();
        assert!(loaded.is_empty());
        assert_eq!(report.status, LoadStatus::Loaded { rows: 0 });
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cards.xlsx");
        fs::write(&path, b"definitely not a zip archive").unwrap();

        let err = SpreadsheetPersistence::new(&path).load().unwrap_err();
        assert!(matches!(err, StorageError::SpreadsheetRead { .. }));
        // File is left as it was
        assert_eq!(fs::read(&path).unwrap(), b"definitely not a zip archive");
    }

    #[test]
    fn test_file_without_id_column_gets_fresh_ids() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("legacy.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, title) in ["QTY", "Card Number", "Card Name"].iter().enumerate() {
            sheet.write_string(0, col as u16, *title).unwrap();
        }
        sheet.write_number(1, 0, 3).unwrap();
        sheet.write_string(1, 1, "ST01-012").unwrap();
        sheet.write_string(1, 2, "Luffy").unwrap();
        workbook.save(&path).unwrap();

        let (cards, _) = SpreadsheetPersistence::new(&path).load().unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].quantity, 3);
        assert_eq!(cards[0].card_number, "ST01-012");
    }

    #[test]
    fn test_escaped_text_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = SpreadsheetPersistence::new(temp_dir.path().join("cards.xlsx"));

        let mut windows = Card::new("OP01-001", "Luffy", 1);
        windows.notes = Some("line1\r\nline2".into());
        let mut control = Card::new("OP01-025", "Zoro", 1);
        control.notes = Some("ctrl\u{1}x".into());
        let mut literal = Card::new("ST02-009", "Law", 1);
        literal.notes = Some("_x000D_ lit".into());
        literal.special_power = Some("_x005F_ and _xZZZZ_".into());
        let cards = vec![windows, control, literal];

        persistence.save(&cards).unwrap();
        let (loaded, _) = persistence.load().unwrap();
        assert_eq!(loaded, cards);

        // Saving what was loaded does not grow the text
        persistence.save(&loaded).unwrap();
        let (reloaded, _) = persistence.load().unwrap();
        assert_eq!(reloaded, cards);
    }

    #[test]
    fn test_unescape_cell() {
        assert_eq!(unescape_cell("a_x000D_b"), "a\rb");
        assert_eq!(unescape_cell("_x005F_x000D_"), "_x000D_");
        assert_eq!(unescape_cell("_xD800_"), "_xD800_");
        assert!(matches!(unescape_cell("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Float(3.0)), "3");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::Bool(true)), "true");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
