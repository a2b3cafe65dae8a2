//! Persisted collection
//!
//! The `Store` owns the in-memory [`Collection`] and the spreadsheet it is
//! backed by. Every mutating call changes the collection first and then
//! flushes it explicitly (when autosave is on), so a caller always gets
//! the mutation result and the save result together.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open_with_config(Config::load()?)?;
//!
//! let input = CardInput::new("OP01-001", "Luffy", 2);
//! store.add(&input, DuplicatePolicy::Merge)?;
//!
//! let reds = store.search(&Filter::term("red"));
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::collection::{AddOutcome, Collection, DuplicatePolicy, QuantityChange};
use crate::config::Config;
use crate::error::{StoreResult, ValidationError};
use crate::export::{self, ExportFormat};
use crate::models::{Card, CardId, CardInput};
use crate::query::{self, Filter};
use crate::stats::Statistics;
use crate::storage::{self, LoadReport, RowWarning, SpreadsheetPersistence};

/// What an import did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows appended as new cards
    pub added: usize,
    /// Rows merged into existing cards
    pub merged: usize,
    /// Rows skipped because they failed validation
    pub warnings: Vec<RowWarning>,
}

/// Collection plus its backing file
pub struct Store {
    collection: Collection,
    persistence: SpreadsheetPersistence,
    config: Config,
    load_report: LoadReport,
    /// Changes not yet written to disk
    dirty: bool,
}

impl Store {
    /// Open the store described by the configuration file and environment
    pub fn open() -> anyhow::Result<Self> {
        let config = Config::load()?;
        Ok(Self::open_with_config(config)?)
    }

    /// Open the store with a specific configuration
    ///
    /// A missing collection file gives an empty store whose
    /// [`load_report`](Self::load_report) is marked missing; the file is
    /// created on the first save. An unreadable file is an error and is
    /// left untouched.
    pub fn open_with_config(config: Config) -> StoreResult<Self> {
        let persistence = SpreadsheetPersistence::new(config.collection_path());
        let (cards, load_report) = persistence.load()?;

        Ok(Self {
            collection: Collection::from_cards(cards),
            persistence,
            config,
            load_report,
            dirty: false,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the backing spreadsheet
    pub fn path(&self) -> &Path {
        self.persistence.path()
    }

    /// Outcome of the last load (warnings for skipped rows, missing file)
    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    /// True when no backing file exists yet, so the caller may want to
    /// choose a location with [`save_as`](Self::save_as)
    pub fn needs_location(&self) -> bool {
        !self.persistence.exists()
    }

    /// True when there are changes that have not been saved
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // ==================== Reads ====================

    /// Owned snapshot of every card, in collection order
    pub fn all(&self) -> Vec<Card> {
        self.collection.all()
    }

    /// Borrow the cards, in collection order
    pub fn cards(&self) -> &[Card] {
        self.collection.as_slice()
    }

    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.collection.get(id)
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    /// Validate form values with the configured rules
    pub fn validate(&self, input: &CardInput) -> Result<Card, ValidationError> {
        if self.config.strict_card_numbers {
            input.validate_strict()
        } else {
            input.validate()
        }
    }

    /// Existing cards that share `card`'s duplicate key
    pub fn duplicates_of(&self, card: &Card) -> Vec<&Card> {
        self.collection
            .find_duplicates(&card.duplicate_key())
            .into_iter()
            .filter_map(|id| self.collection.get(id))
            .collect()
    }

    /// Cards matching a filter
    pub fn search(&self, filter: &Filter) -> Vec<Card> {
        query::search(self.collection.as_slice(), filter)
    }

    /// Statistics over the cards matching a filter
    pub fn statistics(&self, filter: &Filter) -> Statistics {
        Statistics::compute(&self.search(filter))
    }

    /// Export the cards matching a filter
    pub fn export(&self, filter: &Filter, format: ExportFormat, path: &Path) -> StoreResult<usize> {
        let view = self.search(filter);
        Ok(export::export(&view, format, path)?)
    }

    // ==================== Mutations ====================

    /// Validate and add a card
    pub fn add(&mut self, input: &CardInput, policy: DuplicatePolicy) -> StoreResult<AddOutcome> {
        let card = self.validate(input)?;
        self.add_card(card, policy)
    }

    /// Add an already validated card
    pub fn add_card(&mut self, card: Card, policy: DuplicatePolicy) -> StoreResult<AddOutcome> {
        let outcome = self.collection.add(card, policy);
        self.after_mutation()?;
        Ok(outcome)
    }

    /// Replace every field of a card
    pub fn update(&mut self, id: CardId, input: &CardInput) -> StoreResult<()> {
        let card = self.validate(input)?;
        self.collection.update(id, card)?;
        self.after_mutation()
    }

    /// Add or remove copies; reaching zero deletes the card
    pub fn adjust_quantity(&mut self, id: CardId, delta: i64) -> StoreResult<QuantityChange> {
        let change = self.collection.adjust_quantity(id, delta)?;
        self.after_mutation()?;
        Ok(change)
    }

    /// Delete cards; ids that are already gone are ignored
    pub fn delete(&mut self, ids: &[CardId]) -> StoreResult<usize> {
        let removed = self.collection.delete(ids);
        if removed > 0 {
            self.after_mutation()?;
        }
        Ok(removed)
    }

    /// Merge the rows of another `.xlsx` or `.csv` file into the collection
    ///
    /// Saves once at the end rather than per row.
    pub fn import(&mut self, path: &Path, policy: DuplicatePolicy) -> StoreResult<ImportSummary> {
        let (cards, report) = storage::read_table(path)?;
        let mut summary = ImportSummary {
            warnings: report.warnings,
            ..ImportSummary::default()
        };

        for card in cards {
            match self.collection.add(card, policy) {
                AddOutcome::Added { .. } => summary.added += 1,
                AddOutcome::Merged { .. } => summary.merged += 1,
            }
        }

        info!(
            "Imported {:?}: {} added, {} merged, {} skipped",
            path,
            summary.added,
            summary.merged,
            summary.warnings.len()
        );

        if summary.added + summary.merged > 0 {
            self.after_mutation()?;
        }
        Ok(summary)
    }

    // ==================== Persistence ====================

    /// Write the collection to the backing file
    pub fn flush(&mut self) -> StoreResult<()> {
        self.persistence.save(self.collection.as_slice())?;
        self.dirty = false;
        Ok(())
    }

    /// Save to a new location and keep using it
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> StoreResult<()> {
        let path = path.into();
        let previous = self.persistence.path().to_path_buf();
        self.persistence.set_path(&path);

        if let Err(e) = self.flush() {
            self.persistence.set_path(previous);
            return Err(e);
        }
        info!("Collection now saved at {:?}", path);
        Ok(())
    }

    /// Discard in-memory state and re-read the backing file
    pub fn reload(&mut self) -> StoreResult<&LoadReport> {
        let (cards, report) = self.persistence.load()?;
        self.collection = Collection::from_cards(cards);
        self.load_report = report;
        self.dirty = false;
        Ok(&self.load_report)
    }

    fn after_mutation(&mut self) -> StoreResult<()> {
        self.dirty = true;
        if self.config.autosave {
            self.flush()
        } else {
            debug!("Autosave off, {} card(s) pending", self.collection.len());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::storage::LoadStatus;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn test_open_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let store = Store::open_with_config(config.clone()).unwrap();

        assert!(store.is_empty());
        assert!(store.load_report().is_missing());
        assert!(store.needs_location());
        assert_eq!(store.path(), config.collection_path());
        // Opening alone does not create the file
        assert!(!config.collection_path().exists());
    }

    #[test]
    fn test_add_saves_immediately() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let mut store = Store::open_with_config(config.clone()).unwrap();
        store
            .add(&CardInput::new("OP01-001", "Luffy", 2), DuplicatePolicy::Merge)
            .unwrap();
        assert!(!store.is_dirty());
        assert!(!store.needs_location());

        let reopened = Store::open_with_config(config).unwrap();
        assert_eq!(reopened.all(), store.all());
        assert_eq!(
            reopened.load_report().status,
            LoadStatus::Loaded { rows: 1 }
        );
    }

    #[test]
    fn test_invalid_input_changes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = Store::open_with_config(test_config(&temp_dir)).unwrap();

        let err = store
            .add(&CardInput::new("OP01-001", "", "0"), DuplicatePolicy::Merge)
            .unwrap_err();

        match err {
            StoreError::Validation(v) => {
                assert!(v.has_field("Card Name"));
                assert!(v.has_field("QTY"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(store.is_empty());
        assert!(store.needs_location());
    }

    #[test]
    fn test_oversized_notes_rejected_before_saving() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let mut store = Store::open_with_config(config.clone()).unwrap();

        let mut input = CardInput::new("OP01-001", "Luffy", 1);
        input.notes = "n".repeat(40_000);
        let err = store.add(&input, DuplicatePolicy::Merge).unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref v) if v.has_field("Notes")));
        assert!(store.is_empty());
        assert!(!store.is_dirty());

        // Later changes still reach the file
        let id = store
            .add(&CardInput::new("OP01-025", "Zoro", 1), DuplicatePolicy::Merge)
            .unwrap()
            .id();
        let mut edit = store.get(id).unwrap().to_input();
        edit.special_power = "p".repeat(40_000);
        assert!(store.update(id, &edit).is_err());
        assert!(store.get(id).unwrap().special_power.is_none());

        let reopened = Store::open_with_config(config).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.cards()[0].name, "Zoro");
    }

    #[test]
    fn test_strict_numbers_follow_config() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);

        let mut store = Store::open_with_config(config.clone()).unwrap();
        assert!(store
            .add(&CardInput::new("P-001", "Luffy", 1), DuplicatePolicy::Merge)
            .is_err());

        config.strict_card_numbers = false;
        let mut store = Store::open_with_config(config).unwrap();
        assert!(store
            .add(&CardInput::new("P-001", "Luffy", 1), DuplicatePolicy::Merge)
            .is_ok());
    }

    #[test]
    fn test_autosave_off_defers_writes() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            autosave: false,
            ..test_config(&temp_dir)
        };

        let mut store = Store::open_with_config(config.clone()).unwrap();
        store
            .add(&CardInput::new("OP01-001", "Luffy", 1), DuplicatePolicy::Merge)
            .unwrap();
        assert!(store.is_dirty());
        assert!(!config.collection_path().exists());

        store.flush().unwrap();
        assert!(!store.is_dirty());
        assert_eq!(Store::open_with_config(config).unwrap().len(), 1);
    }

    #[test]
    fn test_update_and_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = Store::open_with_config(test_config(&temp_dir)).unwrap();

        let id = store
            .add(&CardInput::new("OP01-001", "Luffy", 1), DuplicatePolicy::Merge)
            .unwrap()
            .id();

        let mut input = store.get(id).unwrap().to_input();
        input.rarity = "L".into();
        input.quantity = "3".into();
        store.update(id, &input).unwrap();
        assert_eq!(store.get(id).unwrap().quantity, 3);
        assert_eq!(store.get(id).unwrap().rarity, "L");

        store.delete(&[id]).unwrap();
        let err = store.update(id, &input).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_delete_absent_does_not_write() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let mut store = Store::open_with_config(config.clone()).unwrap();

        assert_eq!(store.delete(&[uuid::Uuid::new_v4()]).unwrap(), 0);
        assert!(!config.collection_path().exists());
    }

    #[test]
    fn test_adjust_quantity_persists_removal() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let mut store = Store::open_with_config(config.clone()).unwrap();

        let id = store
            .add(&CardInput::new("OP01-001", "Luffy", 2), DuplicatePolicy::Merge)
            .unwrap()
            .id();
        assert_eq!(
            store.adjust_quantity(id, -2).unwrap(),
            QuantityChange::Removed
        );

        assert!(Store::open_with_config(config).unwrap().is_empty());
    }

    #[test]
    fn test_adjust_quantity_overflow_keeps_saved_card() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let mut store = Store::open_with_config(config.clone()).unwrap();

        let id = store
            .add(&CardInput::new("OP01-001", "Luffy", 2), DuplicatePolicy::Merge)
            .unwrap()
            .id();
        assert!(store.adjust_quantity(id, i64::MAX).is_err());
        assert_eq!(store.get(id).unwrap().quantity, 2);

        let reopened = Store::open_with_config(config).unwrap();
        assert_eq!(reopened.get(id).unwrap().quantity, 2);
    }

    #[test]
    fn test_save_as_moves_backing_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = Store::open_with_config(test_config(&temp_dir)).unwrap();
        store
            .add(&CardInput::new("OP01-001", "Luffy", 1), DuplicatePolicy::Merge)
            .unwrap();

        let new_path = temp_dir.path().join("binders").join("main.xlsx");
        store.save_as(&new_path).unwrap();
        assert_eq!(store.path(), new_path);

        store
            .add(&CardInput::new("OP01-025", "Zoro", 1), DuplicatePolicy::Merge)
            .unwrap();
        let (cards, _) = SpreadsheetPersistence::new(&new_path).load().unwrap();
        assert_eq!(cards.len(), 2);
    }

    #[test]
    fn test_save_as_failure_keeps_old_path() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = Store::open_with_config(test_config(&temp_dir)).unwrap();
        let original = store.path().to_path_buf();

        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        assert!(store.save_as(blocker.join("cards.xlsx")).is_err());
        assert_eq!(store.path(), original);
    }

    #[test]
    fn test_reload_discards_unsaved_changes() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            autosave: false,
            ..test_config(&temp_dir)
        };
        let mut store = Store::open_with_config(config).unwrap();
        store
            .add(&CardInput::new("OP01-001", "Luffy", 1), DuplicatePolicy::Merge)
            .unwrap();
        store.flush().unwrap();
        store
            .add(&CardInput::new("OP01-025", "Zoro", 1), DuplicatePolicy::Merge)
            .unwrap();

        store.reload().unwrap();
        assert_eq!(store.len(), 1);
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_import_merges_with_policy() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = Store::open_with_config(test_config(&temp_dir)).unwrap();
        store
            .add(&CardInput::new("OP01-001", "Luffy", 1), DuplicatePolicy::Merge)
            .unwrap();

        let csv_path = temp_dir.path().join("trade.csv");
        std::fs::write(
            &csv_path,
            "QTY,Card Number,Card Name\n2,OP01-001,Luffy\n1,OP01-025,Zoro\n1,,Nobody\n",
        )
        .unwrap();

        let summary = store.import(&csv_path, DuplicatePolicy::Merge).unwrap();
        assert_eq!(summary.added, 1);
        assert_eq!(summary.merged, 1);
        assert_eq!(summary.warnings.len(), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.cards()[0].quantity, 3);
    }

    #[test]
    fn test_search_statistics_and_export() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = Store::open_with_config(test_config(&temp_dir)).unwrap();

        let mut luffy = CardInput::new("OP01-001", "Luffy", 2);
        luffy.color = "Red".into();
        store.add(&luffy, DuplicatePolicy::Merge).unwrap();
        let mut law = CardInput::new("ST02-009", "Law", 1);
        law.color = "Green".into();
        store.add(&law, DuplicatePolicy::Merge).unwrap();

        let filter = Filter::term("red");
        assert_eq!(store.search(&filter).len(), 1);
        assert_eq!(store.statistics(&filter).total_quantity, 2);
        assert_eq!(store.statistics(&Filter::all()).total_quantity, 3);

        let out = temp_dir.path().join("reds.json");
        let before = store.all();
        assert_eq!(store.export(&filter, ExportFormat::Json, &out).unwrap(), 1);
        assert_eq!(store.all(), before);
    }

    #[test]
    fn test_duplicates_of() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = Store::open_with_config(test_config(&temp_dir)).unwrap();
        store
            .add(&CardInput::new("OP01-001", "Luffy", 1), DuplicatePolicy::Merge)
            .unwrap();

        let candidate = store
            .validate(&CardInput::new("op01-001", "luffy", 1))
            .unwrap();
        assert_eq!(store.duplicates_of(&candidate).len(), 1);
    }
}
