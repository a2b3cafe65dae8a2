//! OPTCG Core Library
//!
//! This crate provides the core functionality for OPTCG, a local
//! inventory of One Piece Trading Card Game cards kept in a single
//! spreadsheet.
//!
//! # Architecture
//!
//! - **Collection**: in-memory list of cards, the only mutable state
//! - **Spreadsheet**: one `.xlsx` sheet is the durable copy, rewritten
//!   atomically after each change
//!
//! Searches, statistics and exports run over the in-memory collection.
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open()?;
//!
//! // Add a card, merging with an identical one if present
//! let input = CardInput::new("OP01-001", "Monkey D. Luffy", 2);
//! store.add(&input, DuplicatePolicy::Merge)?;
//!
//! // Query cards
//! let zoros = store.search(&Filter::term("zoro"));
//! ```
//!
//! # Modules
//!
//! - `store`: Persisted collection (main entry point)
//! - `collection`: In-memory collection and duplicate handling
//! - `models`: Card record, form input and validation
//! - `query`: Filters and sorting
//! - `stats`: Totals and breakdowns
//! - `export`: CSV / JSON snapshots
//! - `storage`: Spreadsheet and CSV persistence
//! - `config`: Application configuration

pub mod collection;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod query;
pub mod stats;
pub mod storage;
pub mod store;

pub use collection::{AddOutcome, Collection, DuplicatePolicy, QuantityChange};
pub use config::Config;
pub use error::{FieldIssue, StoreError, StoreResult, ValidationError};
pub use export::ExportFormat;
pub use models::{Card, CardId, CardInput, DuplicateKey};
pub use query::{Constraints, Filter, SortKey};
pub use stats::Statistics;
pub use storage::{LoadReport, LoadStatus, RowWarning, StorageError};
pub use store::{ImportSummary, Store};
