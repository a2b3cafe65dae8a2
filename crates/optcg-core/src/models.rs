//! Data models for OPTCG
//!
//! Defines the card record, the raw form input it is validated from, and the
//! duplicate-detection key used when adding cards to a collection.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FieldIssue, ValidationError};

/// Card colours offered by the product
pub const CARD_COLORS: &[&str] = &[
    "Red",
    "Green",
    "Blue",
    "Black",
    "White",
    "Purple",
    "Yellow",
    "Mixed (Check Notes)",
];

/// Print finishes
pub const FINISHES: &[&str] = &["Normal", "Foil"];

/// Card kinds
pub const CARD_KINDS: &[&str] = &["Leader", "Character", "Event", "Stage", "Don Art"];

/// Rarities, lowest first
pub const CARD_RARITIES: &[&str] = &["C", "UC", "R", "SR", "L", "SEC", "Promo"];

/// Set code letters, set digits, hyphen, card digits (ST04-001, OP01-023)
static CARD_NUMBER_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]+\d+-\d+$").expect("card number pattern is valid"));

/// Longest text a spreadsheet cell can hold, in characters
pub const MAX_TEXT_LEN: usize = 32_767;

/// Stable identifier of a card record
pub type CardId = Uuid;

/// A validated card record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    /// Stable identifier
    pub id: CardId,
    /// Number of copies owned, never zero
    pub quantity: u32,
    /// Printed card number, e.g. `OP01-001`
    pub card_number: String,
    /// Card name
    pub name: String,
    pub crew: String,
    pub color: String,
    /// Foil or Normal
    pub finish: String,
    pub rarity: String,
    pub kind: String,
    pub alt_art: bool,
    pub special_power: Option<String>,
    pub notes: Option<String>,
}

impl Card {
    /// Build a card with the required fields and a fresh id
    ///
    /// Quantity is clamped to at least one.
    pub fn new(card_number: impl Into<String>, name: impl Into<String>, quantity: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            quantity: quantity.max(1),
            card_number: card_number.into(),
            name: name.into(),
            crew: String::new(),
            color: String::new(),
            finish: String::new(),
            rarity: String::new(),
            kind: String::new(),
            alt_art: false,
            special_power: None,
            notes: None,
        }
    }

    /// The attribute tuple that decides whether two records are the same card
    pub fn duplicate_key(&self) -> DuplicateKey {
        DuplicateKey::new(
            &self.card_number,
            &self.name,
            &self.crew,
            &self.color,
            &self.rarity,
            &self.kind,
        )
    }

    pub fn matches_key(&self, key: &DuplicateKey) -> bool {
        &self.duplicate_key() == key
    }

    /// Convert back into form values, e.g. to pre-fill an edit
    pub fn to_input(&self) -> CardInput {
        CardInput {
            id: Some(self.id),
            quantity: self.quantity.to_string(),
            card_number: self.card_number.clone(),
            name: self.name.clone(),
            crew: self.crew.clone(),
            color: self.color.clone(),
            finish: self.finish.clone(),
            rarity: self.rarity.clone(),
            kind: self.kind.clone(),
            alt_art: self.alt_art,
            special_power: self.special_power.clone().unwrap_or_default(),
            notes: self.notes.clone().unwrap_or_default(),
        }
    }

    /// Values searched by free-text queries
    pub fn searchable_fields(&self) -> [&str; 9] {
        [
            &self.card_number,
            &self.name,
            &self.crew,
            &self.color,
            &self.finish,
            &self.rarity,
            &self.kind,
            self.special_power.as_deref().unwrap_or(""),
            self.notes.as_deref().unwrap_or(""),
        ]
    }
}

/// Normalised duplicate-detection key
///
/// Each component is trimmed and lower-cased, so `OP01-001 / Luffy` and
/// `op01-001 / LUFFY ` collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DuplicateKey {
    parts: [String; 6],
}

impl DuplicateKey {
    pub fn new(
        card_number: &str,
        name: &str,
        crew: &str,
        color: &str,
        rarity: &str,
        kind: &str,
    ) -> Self {
        let norm = |s: &str| s.trim().to_lowercase();
        Self {
            parts: [
                norm(card_number),
                norm(name),
                norm(crew),
                norm(color),
                norm(rarity),
                norm(kind),
            ],
        }
    }
}

/// Raw card values as entered by a user or read from a file row
///
/// Nothing here is trusted until [`CardInput::validate`] turns it into a
/// [`Card`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardInput {
    /// Existing id to keep; a fresh one is generated when absent
    pub id: Option<CardId>,
    pub quantity: String,
    pub card_number: String,
    pub name: String,
    pub crew: String,
    pub color: String,
    pub finish: String,
    pub rarity: String,
    pub kind: String,
    pub alt_art: bool,
    pub special_power: String,
    pub notes: String,
}

impl CardInput {
    /// Shorthand for the required fields
    pub fn new(
        card_number: impl Into<String>,
        name: impl Into<String>,
        quantity: impl ToString,
    ) -> Self {
        Self {
            card_number: card_number.into(),
            name: name.into(),
            quantity: quantity.to_string(),
            ..Self::default()
        }
    }

    /// Validate required fields and quantity
    ///
    /// Every offending field is reported, not just the first.
    pub fn validate(&self) -> Result<Card, ValidationError> {
        self.check(false)
    }

    /// Like [`validate`](Self::validate), and also require the card number
    /// to look like `ST04-001`.
    pub fn validate_strict(&self) -> Result<Card, ValidationError> {
        self.check(true)
    }

    fn check(&self, strict: bool) -> Result<Card, ValidationError> {
        let mut issues = Vec::new();

        let card_number = self.card_number.trim();
        if card_number.is_empty() {
            issues.push(FieldIssue::new("Card Number", "cannot be empty"));
        } else if strict && !CARD_NUMBER_FORMAT.is_match(card_number) {
            issues.push(FieldIssue::new(
                "Card Number",
                "invalid format (e.g. ST04-001, OP01-023)",
            ));
        }

        let name = self.name.trim();
        if name.is_empty() {
            issues.push(FieldIssue::new("Card Name", "cannot be empty"));
        }

        let quantity = match parse_quantity(&self.quantity) {
            Ok(q) => q,
            Err(reason) => {
                issues.push(FieldIssue::new("QTY", reason));
                0
            }
        };

        for (field, text) in [
            ("Card Number", card_number),
            ("Card Name", name),
            ("Crew", self.crew.trim()),
            ("Color", self.color.trim()),
            ("Foil / Normal", self.finish.trim()),
            ("Rarity", self.rarity.trim()),
            ("Kind", self.kind.trim()),
            ("Special Power", self.special_power.trim()),
            ("Notes", self.notes.trim()),
        ] {
            if text.chars().count() > MAX_TEXT_LEN {
                issues.push(FieldIssue::new(field, "is longer than 32767 characters"));
            }
        }

        if !issues.is_empty() {
            return Err(ValidationError::new(issues));
        }

        Ok(Card {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            quantity,
            card_number: card_number.to_string(),
            name: name.to_string(),
            crew: self.crew.trim().to_string(),
            color: self.color.trim().to_string(),
            finish: self.finish.trim().to_string(),
            rarity: self.rarity.trim().to_string(),
            kind: self.kind.trim().to_string(),
            alt_art: self.alt_art,
            special_power: non_empty(&self.special_power),
            notes: non_empty(&self.notes),
        })
    }
}

/// Parse a quantity, accepting whole-number floats such as `3.0`
/// (spreadsheets store every number as a float).
fn parse_quantity(raw: &str) -> Result<u32, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("cannot be empty");
    }
    if let Ok(n) = raw.parse::<i64>() {
        return positive(n);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => positive(f as i64),
        Ok(_) => Err("must be a whole number"),
        Err(_) => Err("must be a number"),
    }
}

fn positive(n: i64) -> Result<u32, &'static str> {
    if n < 1 {
        Err("must be at least 1")
    } else {
        u32::try_from(n).map_err(|_| "is too large")
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
