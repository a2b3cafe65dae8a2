//! End-to-end behaviour of the persisted collection

use std::path::Path;

use optcg_core::storage::spreadsheet::{read_workbook, write_workbook};
use optcg_core::storage::SpreadsheetPersistence;
use optcg_core::{
    AddOutcome, Card, CardInput, Collection, Config, DuplicatePolicy, Filter, LoadStatus, Store,
};
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

fn store_in(temp_dir: &TempDir) -> Store {
    let config = Config {
        data_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    Store::open_with_config(config).unwrap()
}

fn full_card() -> Card {
    let mut card = Card::new("OP01-025", "Roronoa Zoro", 3);
    card.crew = "Straw Hat Crew".into();
    card.color = "Red".into();
    card.finish = "Foil".into();
    card.rarity = "SR".into();
    card.kind = "Character".into();
    card.alt_art = true;
    card.special_power = Some("Rush".into());
    card.notes = Some("Sleeved, \"mint\"".into());
    card
}

fn sample_collection() -> Vec<Card> {
    let mut luffy = Card::new("OP01-001", "Monkey D. Luffy", 1);
    luffy.color = "Red".into();
    luffy.kind = "Leader".into();
    let mut law = Card::new("ST02-009", "Trafalgar Law", 2);
    law.color = "Green".into();
    vec![luffy, full_card(), law]
}

#[test]
fn round_trip_preserves_every_field() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cards.xlsx");
    let persistence = SpreadsheetPersistence::new(&path);

    let cards = sample_collection();
    persistence.save(&cards).unwrap();
    let (loaded, report) = persistence.load().unwrap();

    assert_eq!(loaded, cards);
    assert_eq!(report.status, LoadStatus::Loaded { rows: 3 });
    assert!(!report.has_warnings());
}

#[test]
fn empty_filter_is_identity() {
    let cards = sample_collection();
    assert_eq!(optcg_core::query::search(&cards, &Filter::all()), cards);
    assert_eq!(optcg_core::query::search(&cards, &Filter::term("  ")), cards);
    assert!(optcg_core::query::search(&[], &Filter::all()).is_empty());
}

#[test]
fn search_ignores_case() {
    let cards = sample_collection();
    let lower = optcg_core::query::search(&cards, &Filter::term("zoro"));
    let upper = optcg_core::query::search(&cards, &Filter::term("ZORO"));

    assert_eq!(lower, upper);
    assert_eq!(lower.len(), 1);
    assert_eq!(lower[0].name, "Roronoa Zoro");
}

#[test]
fn merge_policy_adds_quantity_in_place() {
    let mut collection = Collection::from_cards(sample_collection());
    let before = collection.all();

    let mut again = full_card();
    again.quantity = 4;
    let outcome = collection.add(again, DuplicatePolicy::Merge);

    assert_eq!(
        outcome,
        AddOutcome::Merged {
            id: before[1].id,
            quantity: 7
        }
    );
    assert_eq!(collection.len(), before.len());
    assert_eq!(collection.as_slice()[0], before[0]);
    assert_eq!(collection.as_slice()[2], before[2]);
}

#[test]
fn keep_separate_policy_appends_row() {
    let mut collection = Collection::from_cards(sample_collection());
    let before = collection.all();

    let outcome = collection.add(full_card(), DuplicatePolicy::KeepSeparate);

    assert!(matches!(outcome, AddOutcome::Added { .. }));
    assert_eq!(collection.len(), before.len() + 1);
    assert_eq!(&collection.as_slice()[..before.len()], before.as_slice());
}

#[test]
fn deleting_unknown_id_changes_nothing() {
    let mut collection = Collection::from_cards(sample_collection());
    let before = collection.all();

    assert_eq!(collection.delete(&[uuid::Uuid::new_v4()]), 0);
    assert_eq!(collection.all(), before);
}

#[test]
fn luffy_quantities_merge_to_five() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = store_in(&temp_dir);

    store
        .add(&CardInput::new("OP01-001", "Luffy", 2), DuplicatePolicy::Merge)
        .unwrap();
    store
        .add(&CardInput::new("OP01-001", "Luffy", 3), DuplicatePolicy::Merge)
        .unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.cards()[0].quantity, 5);

    // And it is what was saved
    let (saved, _) = read_workbook(store.path()).unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].quantity, 5);
}

#[test]
fn interrupted_save_leaves_original_loadable() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cards.xlsx");
    let persistence = SpreadsheetPersistence::new(&path);
    let cards = sample_collection();
    persistence.save(&cards).unwrap();

    // What a crash between writing the temp file and renaming it leaves behind
    let partial = write_workbook(&[Card::new("OP09-001", "Shanks", 1)]).unwrap();
    std::fs::write(
        temp_dir.path().join(".optcg-crash.tmp"),
        &partial[..partial.len() / 2],
    )
    .unwrap();

    let (loaded, report) = persistence.load().unwrap();
    assert_eq!(loaded, cards);
    assert!(!report.has_warnings());
}

fn write_sheet(path: &Path, rows: &[[&str; 3]]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in ["QTY", "Card Number", "Card Name"].iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(r as u32 + 1, c as u16, *value).unwrap();
            }
        }
    }
    workbook.save(path).unwrap();
}

#[test]
fn row_missing_name_is_skipped_with_one_warning() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("hand_made.xlsx");
    write_sheet(
        &path,
        &[
            ["2", "OP01-001", "Luffy"],
            ["1", "OP01-025", ""],
            ["4", "ST02-009", "Law"],
        ],
    );

    let (cards, report) = SpreadsheetPersistence::new(&path).load().unwrap();

    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].name, "Luffy");
    assert_eq!(cards[1].name, "Law");
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].row, 3);
    assert!(report.warnings[0].error.has_field("Card Name"));
}

#[test]
fn unreadable_file_is_left_alone() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        data_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    std::fs::write(config.collection_path(), b"not a workbook").unwrap();

    assert!(Store::open_with_config(config.clone()).is_err());
    assert_eq!(
        std::fs::read(config.collection_path()).unwrap(),
        b"not a workbook"
    );
}
