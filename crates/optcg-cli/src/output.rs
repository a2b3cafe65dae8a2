//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use anyhow::Result;
use serde::Serialize;

use optcg_core::{Card, RowWarning, Statistics};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// A card together with its 1-based position in the collection
#[derive(Debug, Serialize)]
pub struct Listed<'a> {
    pub position: usize,
    #[serde(flatten)]
    pub card: &'a Card,
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single card with every field
    pub fn print_card(&self, listed: &Listed<'_>) -> Result<()> {
        let card = listed.card;
        match self.format {
            OutputFormat::Human => {
                println!("#{}  {}", listed.position, card.id);
                println!("Card Number:   {}", card.card_number);
                println!("Card Name:     {}", card.name);
                println!("QTY:           {}", card.quantity);
                print_field("Crew", &card.crew);
                print_field("Color", &card.color);
                print_field("Foil / Normal", &card.finish);
                print_field("Rarity", &card.rarity);
                print_field("Kind", &card.kind);
                println!("Alt Art:       {}", if card.alt_art { "yes" } else { "no" });
                if let Some(ref power) = card.special_power {
                    print_field("Special Power", power);
                }
                if let Some(ref notes) = card.notes {
                    println!();
                    println!("── Notes ──");
                    println!("{}", notes);
                }
            }
            OutputFormat::Json => print_json(listed)?,
            OutputFormat::Quiet => println!("{}", card.id),
        }
        Ok(())
    }

    /// Print a view as a table
    pub fn print_cards(&self, cards: &[Listed<'_>]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if cards.is_empty() {
                    println!("No cards found.");
                    return Ok(());
                }
                println!(
                    "{:>4} | {:<9} | {:<30} | {:<6} | {:<8} | {:>3}",
                    "#", "Number", "Name", "Rarity", "Color", "QTY"
                );
                for Listed { position, card } in cards {
                    let alt = if card.alt_art { " *" } else { "" };
                    println!(
                        "{:>4} | {:<9} | {:<30} | {:<6} | {:<8} | {:>3}",
                        position,
                        truncate(&card.card_number, 9),
                        truncate(&format!("{}{}", card.name, alt), 30),
                        truncate(&card.rarity, 6),
                        truncate(&card.color, 8),
                        card.quantity
                    );
                }
                let copies: u64 = cards.iter().map(|l| u64::from(l.card.quantity)).sum();
                println!("\n{} card(s), {} cop(ies)", cards.len(), copies);
            }
            OutputFormat::Json => print_json(&cards)?,
            OutputFormat::Quiet => {
                for listed in cards {
                    println!("{}", listed.card.id);
                }
            }
        }
        Ok(())
    }

    /// Print totals and breakdowns
    pub fn print_stats(&self, stats: &Statistics) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("Total cards:     {}", stats.total_quantity);
                println!("Unique entries:  {}", stats.unique_entries);
                println!("Alt art entries: {}", stats.alt_art_entries);
                print_breakdown("By rarity", &stats.by_rarity, stats.total_quantity);
                print_breakdown("By color", &stats.by_color, stats.total_quantity);
                print_breakdown("By kind", &stats.by_kind, stats.total_quantity);
            }
            OutputFormat::Json => print_json(stats)?,
            OutputFormat::Quiet => println!("{}", stats.total_quantity),
        }
        Ok(())
    }

    /// Report rows skipped while reading a file (always to stderr)
    pub fn warn_rows(&self, warnings: &[RowWarning]) {
        if self.is_quiet() || warnings.is_empty() {
            return;
        }
        eprintln!("⚠ Skipped {} invalid row(s):", warnings.len());
        for warning in warnings {
            eprintln!("  {}", warning);
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_field(label: &str, value: &str) {
    if !value.is_empty() {
        println!("{:<15}{}", format!("{}:", label), value);
    }
}

/// Text bar chart of a breakdown; empty buckets are left out
fn print_breakdown(title: &str, buckets: &[(String, u64)], total: u64) {
    let rows: Vec<_> = buckets.iter().filter(|(_, n)| *n > 0).collect();
    if rows.is_empty() {
        return;
    }
    println!();
    println!("{}:", title);
    for (label, count) in rows {
        println!(
            "  {:<20} {:>5}  {}",
            truncate(label, 20),
            count,
            bar(*count, total, 30)
        );
    }
}

fn bar(count: u64, total: u64, width: usize) -> String {
    if total == 0 {
        return String::new();
    }
    let filled = ((count as f64 / total as f64) * width as f64).round() as usize;
    "█".repeat(filled.clamp(1, width))
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
