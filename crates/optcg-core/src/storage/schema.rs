//! On-disk column schema
//!
//! The collection file, CSV exports and JSON exports all share one column
//! set. Header order on write is fixed; on read columns are located by name
//! so files edited by hand (reordered or missing optional columns) still
//! load.

use serde::Serialize;
use uuid::Uuid;

use crate::models::{Card, CardInput};

pub const COL_QTY: &str = "QTY";
pub const COL_NUMBER: &str = "Card Number";
pub const COL_NAME: &str = "Card Name";
pub const COL_CREW: &str = "Crew";
pub const COL_COLOR: &str = "Color";
pub const COL_FINISH: &str = "Foil / Normal";
pub const COL_RARITY: &str = "Rarity";
pub const COL_KIND: &str = "Kind";
pub const COL_ALT_ART: &str = "Alt Art";
pub const COL_SPECIAL_POWER: &str = "Special Power";
pub const COL_NOTES: &str = "Notes";
pub const COL_ID: &str = "ID";

/// Header row, in write order
pub const COLUMNS: [&str; 12] = [
    COL_QTY,
    COL_NUMBER,
    COL_NAME,
    COL_CREW,
    COL_COLOR,
    COL_FINISH,
    COL_RARITY,
    COL_KIND,
    COL_ALT_ART,
    COL_SPECIAL_POWER,
    COL_NOTES,
    COL_ID,
];

/// Columns a file must have to be recognised as a collection
pub const REQUIRED_COLUMNS: [&str; 3] = [COL_QTY, COL_NUMBER, COL_NAME];

/// Serialized form of a card, keyed by column header
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CardRow<'a> {
    #[serde(rename = "QTY")]
    pub quantity: u32,
    #[serde(rename = "Card Number")]
    pub card_number: &'a str,
    #[serde(rename = "Card Name")]
    pub name: &'a str,
    #[serde(rename = "Crew")]
    pub crew: &'a str,
    #[serde(rename = "Color")]
    pub color: &'a str,
    #[serde(rename = "Foil / Normal")]
    pub finish: &'a str,
    #[serde(rename = "Rarity")]
    pub rarity: &'a str,
    #[serde(rename = "Kind")]
    pub kind: &'a str,
    #[serde(rename = "Alt Art")]
    pub alt_art: bool,
    #[serde(rename = "Special Power")]
    pub special_power: Option<&'a str>,
    #[serde(rename = "Notes")]
    pub notes: Option<&'a str>,
    #[serde(rename = "ID")]
    pub id: String,
}

impl<'a> From<&'a Card> for CardRow<'a> {
    fn from(card: &'a Card) -> Self {
        Self {
            quantity: card.quantity,
            card_number: &card.card_number,
            name: &card.name,
            crew: &card.crew,
            color: &card.color,
            finish: &card.finish,
            rarity: &card.rarity,
            kind: &card.kind,
            alt_art: card.alt_art,
            special_power: card.special_power.as_deref(),
            notes: card.notes.as_deref(),
            id: card.id.to_string(),
        }
    }
}

/// Position of each known column within a file's header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    positions: [Option<usize>; 12],
}

impl ColumnMap {
    /// Locate columns by (case-insensitive) header name
    ///
    /// Returns the names of required columns that are missing on failure.
    pub fn from_headers<'h, I>(headers: I) -> Result<Self, Vec<&'static str>>
    where
        I: IntoIterator<Item = &'h str>,
    {
        let mut positions = [None; 12];
        for (idx, header) in headers.into_iter().enumerate() {
            let header = header.trim();
            if let Some(slot) = COLUMNS
                .iter()
                .position(|c| c.eq_ignore_ascii_case(header))
            {
                // First occurrence wins
                positions[slot].get_or_insert(idx);
            }
        }

        let missing: Vec<_> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| positions[column_slot(col)].is_none())
            .collect();

        if missing.is_empty() {
            Ok(Self { positions })
        } else {
            Err(missing)
        }
    }

    fn cell<'c>(&self, row: &'c [String], column: &str) -> &'c str {
        self.positions[column_slot(column)]
            .and_then(|idx| row.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Build unvalidated form values from one row of cell text
    pub fn to_input(&self, row: &[String]) -> CardInput {
        CardInput {
            id: Uuid::parse_str(self.cell(row, COL_ID).trim()).ok(),
            quantity: self.cell(row, COL_QTY).to_string(),
            card_number: self.cell(row, COL_NUMBER).to_string(),
            name: self.cell(row, COL_NAME).to_string(),
            crew: self.cell(row, COL_CREW).to_string(),
            color: self.cell(row, COL_COLOR).to_string(),
            finish: self.cell(row, COL_FINISH).to_string(),
            rarity: self.cell(row, COL_RARITY).to_string(),
            kind: self.cell(row, COL_KIND).to_string(),
            alt_art: parse_flag(self.cell(row, COL_ALT_ART)),
            special_power: self.cell(row, COL_SPECIAL_POWER).to_string(),
            notes: self.cell(row, COL_NOTES).to_string(),
        }
    }
}

fn column_slot(column: &str) -> usize {
    COLUMNS
        .iter()
        .position(|c| *c == column)
        .unwrap_or_else(|| unreachable!("unknown column {column}"))
}

/// Interpret a boolean cell; anything unrecognised is false
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1" | "x"
    )
}

/// True when every cell is blank
pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}
