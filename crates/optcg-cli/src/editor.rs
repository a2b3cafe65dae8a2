//! Interactive input
//!
//! Prompts, confirmations and $EDITOR support for card notes.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::Command;

use anyhow::{bail, Context, Result};

use optcg_core::{Card, DuplicatePolicy};

/// Open notes in the user's preferred editor and return the edited text
///
/// Uses $EDITOR, $VISUAL, or falls back to common editors.
pub fn edit_text(initial_content: &str) -> Result<String> {
    let editor = find_editor()?;

    let file = tempfile::Builder::new()
        .prefix("optcg-notes-")
        .suffix(".txt")
        .tempfile()
        .context("Failed to create temp file for editing")?;
    fs::write(file.path(), initial_content)
        .with_context(|| format!("Failed to write temp file: {:?}", file.path()))?;

    let status = Command::new(&editor)
        .arg(file.path())
        .status()
        .with_context(|| format!("Failed to run editor: {}", editor))?;

    if !status.success() {
        bail!(
            "Editor '{}' exited with non-zero status. Check that your editor is configured correctly.",
            editor
        );
    }

    let content = fs::read_to_string(file.path())
        .with_context(|| format!("Failed to read edited file: {:?}", file.path()))?;
    Ok(content.trim_end().to_string())
}

/// Find the user's preferred editor
fn find_editor() -> Result<String> {
    for var in ["EDITOR", "VISUAL"] {
        if let Ok(editor) = env::var(var) {
            if !editor.is_empty() {
                return Ok(editor);
            }
        }
    }

    let common_editors = ["nano", "vim", "vi", "emacs", "notepad"];
    for editor in common_editors {
        if command_exists(editor) {
            return Ok(editor.to_string());
        }
    }

    bail!(
        "No editor found. Set $EDITOR environment variable.\n\
         Example: export EDITOR=nano"
    )
}

/// Check if a command exists in PATH
fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// True when stdin is a terminal we can ask questions on
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin)
}

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !is_interactive() {
        return Ok(false);
    }

    let input = read_answer(&format!("{} [y/N] ", prompt))?;
    Ok(matches!(input.to_lowercase().as_str(), "y" | "yes"))
}

/// Prompt with the current value shown; `None` keeps it
pub fn prompt_with_default(label: &str, current: &str) -> Result<Option<String>> {
    let prompt = if current.is_empty() {
        format!("{}: ", label)
    } else {
        format!("{} [{}]: ", label, current)
    };
    let input = read_answer(&prompt)?;
    Ok(if input.is_empty() { None } else { Some(input) })
}

/// Ask what to do with a card that matches existing ones
///
/// `None` means the user cancelled.
pub fn choose_policy(matches: &[&Card]) -> Result<Option<DuplicatePolicy>> {
    if !is_interactive() {
        bail!("This card is already in the collection. Pass --merge or --separate.");
    }

    println!("This card is already in the collection:");
    for card in matches {
        println!(
            "  {} {} ({} cop{})",
            card.card_number,
            card.name,
            card.quantity,
            if card.quantity == 1 { "y" } else { "ies" }
        );
    }

    loop {
        let answer = read_answer("[m]erge quantities, keep [s]eparate, or [c]ancel? ")?;
        match parse_policy_answer(&answer) {
            Some(choice) => return Ok(choice),
            None => println!("Please answer m, s or c."),
        }
    }
}

/// `Some(None)` is an explicit cancel; `None` is an unrecognised answer
fn parse_policy_answer(answer: &str) -> Option<Option<DuplicatePolicy>> {
    match answer.trim().to_lowercase().as_str() {
        "m" | "merge" => Some(Some(DuplicatePolicy::Merge)),
        "s" | "separate" => Some(Some(DuplicatePolicy::KeepSeparate)),
        "c" | "cancel" | "" => Some(None),
        _ => None,
    }
}

fn read_answer(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
