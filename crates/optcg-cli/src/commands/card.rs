//! Card command handlers

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use optcg_core::query::sort_view;
use optcg_core::{
    AddOutcome, Card, CardId, CardInput, DuplicatePolicy, Filter, QuantityChange, SortKey, Store,
};

use crate::args::{CardFields, PolicyArgs};
use crate::editor::{choose_policy, confirm, edit_text, is_interactive, prompt_with_default};
use crate::output::{Listed, Output};

/// Add a card, asking what to do if it is already in the collection
pub fn add(
    store: &mut Store,
    mut input: CardInput,
    fields: CardFields,
    policy: PolicyArgs,
    output: &Output,
) -> Result<()> {
    fields.apply_to(&mut input);
    let card = store.validate(&input)?;

    let duplicates = store.duplicates_of(&card);
    let policy = if duplicates.is_empty() {
        DuplicatePolicy::KeepSeparate
    } else if let Some(policy) = policy.policy() {
        policy
    } else {
        match choose_policy(&duplicates)? {
            Some(policy) => policy,
            None => {
                output.message("Cancelled.");
                return Ok(());
            }
        }
    };

    let was_missing = store.needs_location();
    let outcome = store.add_card(card, policy).context("Failed to add card")?;

    if was_missing && !store.needs_location() {
        output.message(&format!(
            "Created new collection at {}",
            store.path().display()
        ));
    }

    let id = outcome.id();
    let listed = listed_card(store, id)?;
    match outcome {
        AddOutcome::Added { .. } => output.success(&format!(
            "Added {} {} as #{}",
            listed.card.card_number, listed.card.name, listed.position
        )),
        AddOutcome::Merged { quantity, .. } => output.success(&format!(
            "Merged into #{}, now {} copies",
            listed.position, quantity
        )),
    }
    output.print_card(&listed)
}

/// Edit a card; with no field flags, prompts for each field
pub fn edit(
    store: &mut Store,
    reference: &str,
    mut input: CardInput,
    fields: CardFields,
    edit_notes: bool,
    output: &Output,
) -> Result<()> {
    let id = resolve_card(store, reference)?;
    let current = store
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("Card not found: {}", reference))?;

    let nothing_given = fields.is_empty()
        && input.card_number.is_empty()
        && input.name.is_empty()
        && input.quantity.is_empty()
        && !edit_notes;

    let mut edited = current.to_input();
    if nothing_given {
        if !is_interactive() {
            bail!("Nothing to change. Pass field flags such as --qty or --rarity.");
        }
        println!(
            "Editing #{}: {} {}",
            position_of(store, id),
            current.card_number,
            current.name
        );
        println!("Press Enter to keep current value, or type new value.\n");
        prompt_fields(&mut edited)?;
    } else {
        for (value, slot) in [
            (std::mem::take(&mut input.card_number), &mut edited.card_number),
            (std::mem::take(&mut input.name), &mut edited.name),
            (std::mem::take(&mut input.quantity), &mut edited.quantity),
        ] {
            if !value.is_empty() {
                *slot = value;
            }
        }
        fields.apply_to(&mut edited);
    }

    if edit_notes {
        edited.notes = edit_text(&edited.notes)?;
    }

    store.update(id, &edited).context("Failed to update card")?;

    output.success("Card updated");
    output.print_card(&listed_card(store, id)?)
}

fn prompt_fields(input: &mut CardInput) -> Result<()> {
    let text_fields = [
        ("Card Number", &mut input.card_number),
        ("Card Name", &mut input.name),
        ("QTY", &mut input.quantity),
        ("Crew", &mut input.crew),
        ("Color", &mut input.color),
        ("Foil / Normal", &mut input.finish),
        ("Rarity", &mut input.rarity),
        ("Kind", &mut input.kind),
        ("Special Power", &mut input.special_power),
    ];
    for (label, slot) in text_fields {
        if let Some(value) = prompt_with_default(label, slot.as_str())? {
            *slot = value;
        }
    }

    let current = if input.alt_art { "y" } else { "n" };
    if let Some(answer) = prompt_with_default("Alt Art (y/n)", current)? {
        input.alt_art = matches!(answer.to_lowercase().as_str(), "y" | "yes" | "true");
    }
    Ok(())
}

/// Remove one or more cards
pub fn remove(store: &mut Store, references: &[String], yes: bool, output: &Output) -> Result<()> {
    let ids = references
        .iter()
        .map(|r| resolve_card(store, r))
        .collect::<Result<Vec<_>>>()?;

    if output.should_prompt() && !yes {
        println!("Remove {} card(s):", ids.len());
        for id in &ids {
            if let Some(card) = store.get(*id) {
                println!(
                    "  #{} {} {} (x{})",
                    position_of(store, *id),
                    card.card_number,
                    card.name,
                    card.quantity
                );
            }
        }
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let removed = store.delete(&ids).context("Failed to remove cards")?;
    output.success(&format!("Removed {} card(s)", removed));
    Ok(())
}

/// Add or remove copies of a card
pub fn qty(store: &mut Store, reference: &str, delta: i64, output: &Output) -> Result<()> {
    let id = resolve_card(store, reference)?;
    let label = store
        .get(id)
        .map(|c| format!("{} {}", c.card_number, c.name))
        .unwrap_or_default();

    match store
        .adjust_quantity(id, delta)
        .context("Failed to change quantity")?
    {
        QuantityChange::Updated { quantity } => {
            output.success(&format!("{} now has {} copies", label, quantity))
        }
        QuantityChange::Removed => output.success(&format!("Removed {} (no copies left)", label)),
    }
    Ok(())
}

/// List the cards matching a filter
pub fn list(store: &Store, filter: &Filter, sort: Option<SortKey>, output: &Output) -> Result<()> {
    let mut view = store.search(filter);
    if let Some(key) = sort {
        sort_view(&mut view, key);
    }
    output.print_cards(&listed_view(store, &view))
}

/// Show a single card
pub fn show(store: &Store, reference: &str, output: &Output) -> Result<()> {
    let id = resolve_card(store, reference)?;
    output.print_card(&listed_card(store, id)?)
}

/// Resolve a card reference: 1-based position, full id, or id prefix
pub fn resolve_card(store: &Store, reference: &str) -> Result<CardId> {
    let reference = reference.trim().trim_start_matches('#');

    if let Ok(position) = reference.parse::<usize>() {
        return match position.checked_sub(1).and_then(|i| store.cards().get(i)) {
            Some(card) => Ok(card.id),
            None => bail!(
                "No card at position {} (collection has {} card(s))",
                position,
                store.len()
            ),
        };
    }

    if let Ok(uuid) = Uuid::parse_str(reference) {
        if store.get(uuid).is_some() {
            return Ok(uuid);
        }
        bail!("No card found with id {}", uuid);
    }

    let reference = reference.to_lowercase();
    let matches: Vec<_> = store
        .cards()
        .iter()
        .filter(|c| c.id.to_string().starts_with(&reference))
        .collect();

    match matches.len() {
        0 => bail!("No card found matching: {}", reference),
        1 => Ok(matches[0].id),
        _ => {
            eprintln!("Multiple cards match '{}':", reference);
            for card in &matches {
                eprintln!("  {} - {} {}", card.id, card.card_number, card.name);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

fn position_of(store: &Store, id: CardId) -> usize {
    store
        .cards()
        .iter()
        .position(|c| c.id == id)
        .map_or(0, |i| i + 1)
}

fn listed_card(store: &Store, id: CardId) -> Result<Listed<'_>> {
    let card = store
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("Card not found: {}", id))?;
    Ok(Listed {
        position: position_of(store, id),
        card,
    })
}

/// Pair each card of a view with its collection position
pub fn listed_view<'a>(store: &Store, view: &'a [Card]) -> Vec<Listed<'a>> {
    let positions: HashMap<CardId, usize> = store
        .cards()
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id, i + 1))
        .collect();

    view.iter()
        .map(|card| Listed {
            position: positions.get(&card.id).copied().unwrap_or(0),
            card,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use optcg_core::Config;
    use tempfile::TempDir;

    fn store_with_cards(temp_dir: &TempDir) -> Store {
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };
        let mut store = Store::open_with_config(config).unwrap();
        for (number, name) in [("OP01-001", "Luffy"), ("OP01-025", "Zoro"), ("ST02-009", "Law")] {
            store
                .add(&CardInput::new(number, name, 1), DuplicatePolicy::KeepSeparate)
                .unwrap();
        }
        store
    }

    #[test]
    fn test_resolve_by_position() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_with_cards(&temp_dir);

        assert_eq!(resolve_card(&store, "2").unwrap(), store.cards()[1].id);
        assert_eq!(resolve_card(&store, "#3").unwrap(), store.cards()[2].id);
        assert!(resolve_card(&store, "0").is_err());
        assert!(resolve_card(&store, "4").is_err());
    }

    #[test]
    fn test_resolve_by_id_and_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_with_cards(&temp_dir);
        let id = store.cards()[0].id;

        assert_eq!(resolve_card(&store, &id.to_string()).unwrap(), id);
        assert_eq!(
            resolve_card(&store, &id.to_string().to_uppercase()).unwrap(),
            id
        );
        assert!(resolve_card(&store, &Uuid::new_v4().to_string()).is_err());
        assert!(resolve_card(&store, "zzzz").is_err());
    }

    #[test]
    fn test_listed_view_keeps_collection_positions() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_with_cards(&temp_dir);

        let view = store.search(&Filter::term("law"));
        let listed = listed_view(&store, &view);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].position, 3);
    }
}
