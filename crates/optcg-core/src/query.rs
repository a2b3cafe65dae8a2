//! Search and filtering
//!
//! A [`Filter`] combines a free-text term with optional field constraints.
//! Evaluation is pure: the same cards and filter always give the same view,
//! which is used for listing, statistics and export alike.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{Card, CARD_RARITIES};

/// Exact-match restrictions, compared case-insensitively
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    pub color: Option<String>,
    pub rarity: Option<String>,
    pub kind: Option<String>,
    pub finish: Option<String>,
    /// Keep only alternate-art cards
    #[serde(default)]
    pub alt_art_only: bool,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.color.is_none()
            && self.rarity.is_none()
            && self.kind.is_none()
            && self.finish.is_none()
            && !self.alt_art_only
    }

    fn matches(&self, card: &Card) -> bool {
        field_matches(&self.color, &card.color)
            && field_matches(&self.rarity, &card.rarity)
            && field_matches(&self.kind, &card.kind)
            && field_matches(&self.finish, &card.finish)
            && (!self.alt_art_only || card.alt_art)
    }
}

fn field_matches(wanted: &Option<String>, value: &str) -> bool {
    match wanted {
        Some(w) => w.trim().to_lowercase() == value.trim().to_lowercase(),
        None => true,
    }
}

/// Free-text term plus constraints, ANDed together
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub constraints: Constraints,
}

impl Filter {
    /// Filter that matches everything
    pub fn all() -> Self {
        Self::default()
    }

    /// Free-text filter without constraints
    pub fn term(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            constraints: Constraints::default(),
        }
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.term.trim().is_empty() && self.constraints.is_empty()
    }

    /// Check a single card
    pub fn matches(&self, card: &Card) -> bool {
        self.constraints.matches(card) && term_matches(&self.term.trim().to_lowercase(), card)
    }
}

/// Substring match against any searchable field; `needle` is already folded
fn term_matches(needle: &str, card: &Card) -> bool {
    needle.is_empty()
        || card
            .searchable_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
}

/// Cards matching `filter`, in their original order
pub fn search(cards: &[Card], filter: &Filter) -> Vec<Card> {
    let needle = filter.term.trim().to_lowercase();
    cards
        .iter()
        .filter(|card| filter.constraints.matches(card) && term_matches(&needle, card))
        .cloned()
        .collect()
}

/// Display orderings for a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Number,
    Name,
    Quantity,
    Rarity,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "number" | "card_number" => Ok(SortKey::Number),
            "name" => Ok(SortKey::Name),
            "qty" | "quantity" => Ok(SortKey::Quantity),
            "rarity" => Ok(SortKey::Rarity),
            other => Err(format!(
                "unknown sort key '{}' (expected number, name, quantity or rarity)",
                other
            )),
        }
    }
}

/// Re-sort a view in place; ties keep their collection order
///
/// Quantity sorts largest first; rarity sorts by catalogue rank, unknown
/// rarities last.
pub fn sort_view(view: &mut [Card], key: SortKey) {
    view.sort_by(|a, b| compare(a, b, key));
}

fn compare(a: &Card, b: &Card, key: SortKey) -> Ordering {
    match key {
        SortKey::Number => a
            .card_number
            .to_lowercase()
            .cmp(&b.card_number.to_lowercase()),
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::Quantity => b.quantity.cmp(&a.quantity),
        SortKey::Rarity => rarity_rank(&a.rarity).cmp(&rarity_rank(&b.rarity)),
    }
}

fn rarity_rank(rarity: &str) -> usize {
    CARD_RARITIES
        .iter()
        .position(|r| r.eq_ignore_ascii_case(rarity.trim()))
        .unwrap_or(CARD_RARITIES.len())
}
