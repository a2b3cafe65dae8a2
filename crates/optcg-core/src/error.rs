//! Collection-level errors
//!
//! Storage failures live in [`crate::storage::StorageError`]; this module
//! covers bad input and stale identifiers.

use std::fmt;

use thiserror::Error;

use crate::models::CardId;
use crate::storage::StorageError;

/// One rejected field and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Column name of the field, e.g. `Card Name`
    pub field: &'static str,
    pub reason: &'static str,
}

impl FieldIssue {
    pub fn new(field: &'static str, reason: &'static str) -> Self {
        Self { field, reason }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

/// A proposed card was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid card: {}", join_issues(.issues))]
pub struct ValidationError {
    issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<FieldIssue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    /// Names of the offending fields, in form order
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.issues.iter().map(|i| i.field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors returned by collection operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The identifier no longer refers to a card
    #[error("Card not found: {id}")]
    NotFound { id: CardId },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl StoreError {
    /// Every collection error can be retried with new input or a new path
    pub fn is_recoverable(&self) -> bool {
        match self {
            StoreError::Validation(_) | StoreError::NotFound { .. } => true,
            StoreError::Storage(e) => e.is_recoverable(),
        }
    }
}

/// Result type for collection operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new(vec![
            FieldIssue::new("Card Name", "cannot be empty"),
            FieldIssue::new("QTY", "must be at least 1"),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid card: Card Name cannot be empty; QTY must be at least 1"
        );
    }

    #[test]
    fn test_not_found_display() {
        let id = uuid::Uuid::new_v4();
        let err = StoreError::NotFound { id };
        assert!(err.to_string().contains(&id.to_string()));
        assert!(err.is_recoverable());
    }
}
