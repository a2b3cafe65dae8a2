//! Collection statistics
//!
//! Totals and quantity breakdowns over a view, the numbers behind the
//! rarity/colour/kind charts.

use serde::Serialize;

use crate::models::{Card, CARD_KINDS, CARD_RARITIES};

/// Summary of a view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Sum of all quantities
    pub total_quantity: u64,
    /// Number of rows
    pub unique_entries: usize,
    /// Rows marked alternate art
    pub alt_art_entries: usize,
    /// Quantity per rarity, catalogue order first
    pub by_rarity: Vec<(String, u64)>,
    /// Quantity per colour, in first-seen order
    pub by_color: Vec<(String, u64)>,
    /// Quantity per kind, catalogue order first
    pub by_kind: Vec<(String, u64)>,
}

impl Statistics {
    pub fn compute(cards: &[Card]) -> Self {
        let mut by_rarity = seeded(CARD_RARITIES);
        let mut by_kind = seeded(CARD_KINDS);
        let mut by_color = Vec::new();

        for card in cards {
            let qty = u64::from(card.quantity);
            tally(&mut by_rarity, &card.rarity, qty);
            tally(&mut by_kind, &card.kind, qty);
            tally(&mut by_color, &card.color, qty);
        }

        Self {
            total_quantity: cards.iter().map(|c| u64::from(c.quantity)).sum(),
            unique_entries: cards.len(),
            alt_art_entries: cards.iter().filter(|c| c.alt_art).count(),
            by_rarity,
            by_color,
            by_kind,
        }
    }
}

fn seeded(labels: &[&str]) -> Vec<(String, u64)> {
    labels.iter().map(|l| (l.to_string(), 0)).collect()
}

/// Add to the bucket whose label matches case-insensitively; blank values
/// are not counted.
fn tally(buckets: &mut Vec<(String, u64)>, label: &str, qty: u64) {
    let label = label.trim();
    if label.is_empty() {
        return;
    }
    match buckets.iter_mut().find(|(l, _)| l.eq_ignore_ascii_case(label)) {
        Some((_, total)) => *total += qty,
        None => buckets.push((label.to_string(), qty)),
    }
}
