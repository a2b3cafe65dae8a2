//! In-memory collection
//!
//! An ordered list of cards with the add/update/delete rules of the product.
//! Nothing here touches the disk; [`Store`](crate::Store) pairs a
//! `Collection` with the persistence layer.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FieldIssue, StoreError, StoreResult, ValidationError};
use crate::models::{Card, CardId, DuplicateKey};

/// What to do when an added card matches an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Add the new quantity to the first matching card
    Merge,
    /// Append the new card as its own row
    KeepSeparate,
}

/// Result of [`Collection::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Appended as a new row
    Added { id: CardId },
    /// Merged into an existing row, which now holds `quantity` copies
    Merged { id: CardId, quantity: u32 },
}

impl AddOutcome {
    /// Id of the row that holds the added copies
    pub fn id(&self) -> CardId {
        match self {
            AddOutcome::Added { id } | AddOutcome::Merged { id, .. } => *id,
        }
    }
}

/// Result of [`Collection::adjust_quantity`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Updated { quantity: u32 },
    /// Quantity fell to zero and the card was removed
    Removed,
}

/// Ordered card records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    cards: Vec<Card>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already validated cards, keeping their order
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    /// Borrow the cards in order
    pub fn as_slice(&self) -> &[Card] {
        &self.cards
    }

    /// Owned snapshot of every card
    ///
    /// Changing the returned vector does not affect the collection.
    pub fn all(&self) -> Vec<Card> {
        self.cards.clone()
    }

    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    /// Row index of a card
    pub fn position(&self, id: CardId) -> Option<usize> {
        self.cards.iter().position(|c| c.id == id)
    }

    /// Ids of every card with the given duplicate key, in order
    pub fn find_duplicates(&self, key: &DuplicateKey) -> Vec<CardId> {
        self.cards
            .iter()
            .filter(|c| c.matches_key(key))
            .map(|c| c.id)
            .collect()
    }

    /// Add a card, resolving duplicates with `policy`
    ///
    /// With [`DuplicatePolicy::Merge`] the first matching row absorbs the new
    /// quantity; otherwise (or when nothing matches) the card is appended.
    pub fn add(&mut self, card: Card, policy: DuplicatePolicy) -> AddOutcome {
        if policy == DuplicatePolicy::Merge {
            let key = card.duplicate_key();
            if let Some(existing) = self.cards.iter_mut().find(|c| c.matches_key(&key)) {
                existing.quantity = existing.quantity.saturating_add(card.quantity);
                debug!(
                    "Merged {} x{} into {} (now {})",
                    card.card_number, card.quantity, existing.id, existing.quantity
                );
                return AddOutcome::Merged {
                    id: existing.id,
                    quantity: existing.quantity,
                };
            }
        }

        let id = self.push_unique(card);
        AddOutcome::Added { id }
    }

    /// Replace every field of a card, keeping its id and position
    pub fn update(&mut self, id: CardId, mut card: Card) -> StoreResult<()> {
        let slot = self
            .cards
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound { id })?;
        card.id = id;
        *slot = card;
        debug!("Updated card {}", id);
        Ok(())
    }

    /// Change a card's quantity by `delta`
    ///
    /// A result of zero or less deletes the card; one above `u32::MAX` is
    /// rejected and leaves the card as it was.
    pub fn adjust_quantity(&mut self, id: CardId, delta: i64) -> StoreResult<QuantityChange> {
        let pos = self.position(id).ok_or(StoreError::NotFound { id })?;
        let next = i64::from(self.cards[pos].quantity).saturating_add(delta);

        if next <= 0 {
            self.cards.remove(pos);
            debug!("Quantity of {} reached zero, removed", id);
            return Ok(QuantityChange::Removed);
        }

        let quantity = u32::try_from(next)
            .map_err(|_| ValidationError::new(vec![FieldIssue::new("QTY", "is too large")]))?;
        self.cards[pos].quantity = quantity;
        Ok(QuantityChange::Updated { quantity })
    }

    /// Remove every listed card
    ///
    /// Unknown ids are ignored. Returns how many cards were removed.
    pub fn delete(&mut self, ids: &[CardId]) -> usize {
        let before = self.cards.len();
        self.cards.retain(|c| !ids.contains(&c.id));
        let removed = before - self.cards.len();
        debug!("Deleted {} of {} requested card(s)", removed, ids.len());
        removed
    }

    /// Append, giving the card a new id if that id is already taken
    fn push_unique(&mut self, mut card: Card) -> CardId {
        if self.get(card.id).is_some() {
            card.id = uuid::Uuid::new_v4();
        }
        let id = card.id;
        self.cards.push(card);
        id
    }
}

impl IntoIterator for Collection {
    type Item = Card;
    type IntoIter = std::vec::IntoIter<Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.into_iter()
    }
}
