//! Status command handler

use anyhow::Result;
use chrono::{DateTime, Local};

use optcg_core::{Filter, LoadStatus, Store};

use crate::output::{Output, OutputFormat};

/// Size and modification time of the collection file, if it exists
struct FileInfo {
    size: u64,
    modified: Option<DateTime<Local>>,
}

fn file_info(store: &Store) -> Option<FileInfo> {
    let metadata = std::fs::metadata(store.path()).ok()?;
    Some(FileInfo {
        size: metadata.len(),
        modified: metadata.modified().ok().map(DateTime::<Local>::from),
    })
}

/// Show status information
pub fn show(store: &Store, output: &Output) -> Result<()> {
    let config = store.config();
    let report = store.load_report();
    let info = file_info(store);
    let stats = store.statistics(&Filter::all());

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "collection": {
                        "path": store.path(),
                        "exists": info.is_some(),
                        "size": info.as_ref().map(|i| i.size),
                        "modified": info.as_ref().and_then(|i| i.modified).map(|m| m.to_rfc3339()),
                    },
                    "autosave": config.autosave,
                    "counts": {
                        "entries": stats.unique_entries,
                        "copies": stats.total_quantity
                    },
                    "skipped_rows": report.warnings.len()
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", store.path().display());
        }
        OutputFormat::Human => {
            println!("OPTCG Status");
            println!("============");
            println!();
            println!("Collection:");
            println!("  File:     {}", store.path().display());
            match &info {
                Some(info) => {
                    println!("  Size:     {}", human_size(info.size));
                    if let Some(modified) = info.modified {
                        println!("  Modified: {}", modified.format("%Y-%m-%d %H:%M"));
                    }
                }
                None => println!("  (not created yet; it is written on the first change)"),
            }
            println!("  Autosave: {}", if config.autosave { "on" } else { "off" });
            println!();
            println!("Contents:");
            println!("  Entries: {}", stats.unique_entries);
            println!("  Copies:  {}", stats.total_quantity);
            if let LoadStatus::Loaded { .. } = report.status {
                if report.has_warnings() {
                    println!();
                    println!("{} row(s) were skipped when loading:", report.warnings.len());
                    for warning in &report.warnings {
                        println!("  {}", warning);
                    }
                }
            }
        }
    }

    Ok(())
}

fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
