//! OPTCG CLI
//!
//! Command-line interface for OPTCG - One Piece card collection management.

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use optcg_core::{CardInput, Config, ExportFormat, SortKey, StorageError, Store, StoreError};

mod args;
mod commands;
mod editor;
mod output;

use args::{CardFields, FilterArgs, PolicyArgs};
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "optcg")]
#[command(about = "OPTCG - One Piece Trading Card Game collection manager")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Collection file to use instead of the configured one
    #[arg(short, long, global = true, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Configuration file to use
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a card
    Add {
        /// Card number, e.g. OP01-001
        number: String,
        /// Card name
        name: String,
        /// Number of copies
        #[arg(long, default_value = "1")]
        qty: String,
        #[command(flatten)]
        fields: CardFields,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Edit a card (prompts for each field when no flags are given)
    Edit {
        /// Position in the list, id, or id prefix
        card: String,
        /// New card number
        #[arg(long)]
        number: Option<String>,
        /// New card name
        #[arg(long)]
        name: Option<String>,
        /// New number of copies
        #[arg(long)]
        qty: Option<String>,
        #[command(flatten)]
        fields: CardFields,
        /// Edit the notes in $EDITOR
        #[arg(long)]
        edit_notes: bool,
    },
    /// Remove cards
    #[command(alias = "rm")]
    Remove {
        /// Positions, ids, or id prefixes
        #[arg(required = true)]
        cards: Vec<String>,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Add or remove copies (reaching zero removes the card)
    Qty {
        /// Position in the list, id, or id prefix
        card: String,
        /// Change in copies, e.g. 2 or -1
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
    /// List cards
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        filter: FilterArgs,
        /// Sort by number, name, quantity or rarity
        #[arg(long)]
        sort: Option<SortKey>,
    },
    /// Search all fields (case-insensitive)
    Search {
        /// Text to look for
        term: String,
        #[command(flatten)]
        filter: FilterArgs,
        /// Sort by number, name, quantity or rarity
        #[arg(long)]
        sort: Option<SortKey>,
    },
    /// Show card details
    Show {
        /// Position in the list, id, or id prefix
        card: String,
    },
    /// Show totals and breakdowns by rarity, color and kind
    Stats {
        /// Only count cards matching this text
        term: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Export cards as CSV or JSON
    Export {
        /// Output file (default: exported_one_piece_cards next to the collection)
        path: Option<PathBuf>,
        /// csv or json (default: from the file extension, else csv)
        #[arg(long)]
        format: Option<ExportFormat>,
        /// Only export cards matching this text
        #[arg(long)]
        search: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Merge cards from an .xlsx or .csv file
    Import {
        /// File to read
        path: PathBuf,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Save the collection, optionally to a new file
    Save {
        /// New location; later commands use it
        path: Option<PathBuf>,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show collection file and counts
    Status,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, collection_file, autosave, strict_card_numbers, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    if let Err(e) = run(cli, &output) {
        eprintln!("Error: {:#}", e);
        if let Some(hint) = recovery_hint(&e) {
            eprintln!("Hint: {}", hint);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli, output: &Output) -> Result<()> {
    // Config commands don't need the collection
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), cli.config.as_ref(), output);
    }

    let mut config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    if let Some(file) = &cli.file {
        config.collection_file = Some(file.clone());
    }
    init_logging(&config, cli.verbose);

    let mut store = Store::open_with_config(config).context("Failed to open collection")?;
    if store.load_report().has_warnings() {
        output.warn_rows(&store.load_report().warnings);
        if !output.is_quiet() {
            eprintln!("  These rows are dropped the next time the collection is saved.");
        }
    }

    let result = match cli.command {
        Commands::Add {
            number,
            name,
            qty,
            fields,
            policy,
        } => commands::card::add(
            &mut store,
            CardInput::new(number, name, qty),
            fields,
            policy,
            output,
        ),
        Commands::Edit {
            card,
            number,
            name,
            qty,
            fields,
            edit_notes,
        } => {
            let input = CardInput::new(
                number.unwrap_or_default(),
                name.unwrap_or_default(),
                qty.unwrap_or_default(),
            );
            commands::card::edit(&mut store, &card, input, fields, edit_notes, output)
        }
        Commands::Remove { cards, yes } => commands::card::remove(&mut store, &cards, yes, output),
        Commands::Qty { card, delta } => commands::card::qty(&mut store, &card, delta, output),
        Commands::List { filter, sort } => {
            commands::card::list(&store, &filter.into_filter(None), sort, output)
        }
        Commands::Search { term, filter, sort } => {
            commands::card::list(&store, &filter.into_filter(Some(term)), sort, output)
        }
        Commands::Show { card } => commands::card::show(&store, &card, output),
        Commands::Stats { term, filter } => {
            commands::stats::show(&store, &filter.into_filter(term), output)
        }
        Commands::Export {
            path,
            format,
            search,
            filter,
        } => commands::export::export(&store, path, format, &filter.into_filter(search), output),
        Commands::Import { path, policy } => {
            commands::import::import(&mut store, &path, policy, output)
        }
        Commands::Save { path } => {
            commands::save::save(&mut store, path, cli.config.as_ref(), output)
        }
        Commands::Status => commands::status::show(&store, output),
        Commands::Config { .. } => Ok(()), // Handled above
    };

    // With autosave off, changes are written once the command has finished
    if result.is_ok() && store.is_dirty() {
        info!("Writing pending changes");
        store.flush().context("Failed to save collection")?;
    }

    result
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Initialize logging
///
/// Logs go to stderr, or to `log_file` when configured. `RUST_LOG`
/// overrides the level picked by `-v`.
fn init_logging(config: &Config, verbosity: u8) {
    let level = match verbosity {
        0 => "error",
        1 => "info",
        _ => "debug",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("optcg_core={},optcg_cli={}", level, level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    let Some(log_path) = &config.log_file else {
        let _ = builder.with_writer(std::io::stderr).try_init();
        return;
    };

    match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(log_file) => {
            let _ = builder.with_ansi(false).with_writer(log_file).try_init();
        }
        Err(e) => {
            eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
}

/// Suggestion for storage failures, e.g. a locked or corrupt file
fn recovery_hint(error: &anyhow::Error) -> Option<&'static str> {
    error.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<StorageError>() {
            return e.recovery_suggestion();
        }
        match cause.downcast_ref::<StoreError>() {
            Some(StoreError::Storage(e)) => e.recovery_suggestion(),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_negative_qty() {
        let cli = Cli::try_parse_from(["optcg", "qty", "3", "-1"]).unwrap();
        match cli.command {
            Commands::Qty { card, delta } => {
                assert_eq!(card, "3");
                assert_eq!(delta, -1);
            }
            _ => panic!("expected qty command"),
        }
    }

    #[test]
    fn test_merge_and_separate_conflict() {
        let result =
            Cli::try_parse_from(["optcg", "add", "OP01-001", "Luffy", "--merge", "--separate"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_recovery_hint_through_context() {
        let err = StoreError::Storage(StorageError::InvalidFormat {
            path: PathBuf::from("/x.xlsx"),
            details: "worksheet is empty".to_string(),
        });
        let err = anyhow::Error::new(err).context("Failed to open collection");
        assert!(recovery_hint(&err).unwrap().contains("--file"));

        let plain = anyhow::anyhow!("No card at position 9");
        assert_eq!(recovery_hint(&plain), None);
    }
}
