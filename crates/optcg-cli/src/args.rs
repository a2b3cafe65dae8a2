//! Argument groups shared by several commands

use clap::Args;

use optcg_core::{CardInput, Constraints, DuplicatePolicy, Filter};

/// Card fields accepted by `add` and `edit`
#[derive(Args, Debug, Clone, Default)]
pub struct CardFields {
    /// Crew or affiliation
    #[arg(long)]
    pub crew: Option<String>,
    /// Colour (Red, Green, Blue, Black, White, Purple, Yellow, ...)
    #[arg(long)]
    pub color: Option<String>,
    /// Foil or Normal
    #[arg(long)]
    pub finish: Option<String>,
    /// Rarity (C, UC, R, SR, L, SEC, Promo)
    #[arg(long)]
    pub rarity: Option<String>,
    /// Leader, Character, Event, Stage or Don Art
    #[arg(long)]
    pub kind: Option<String>,
    /// Alternate art (true/false)
    #[arg(long, value_name = "BOOL")]
    pub alt_art: Option<bool>,
    /// Special power text
    #[arg(long)]
    pub special_power: Option<String>,
    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,
}

impl CardFields {
    /// True when no field was given on the command line
    pub fn is_empty(&self) -> bool {
        self.crew.is_none()
            && self.color.is_none()
            && self.finish.is_none()
            && self.rarity.is_none()
            && self.kind.is_none()
            && self.alt_art.is_none()
            && self.special_power.is_none()
            && self.notes.is_none()
    }

    /// Overwrite the fields that were given
    pub fn apply_to(self, input: &mut CardInput) {
        let targets = [
            (self.crew, &mut input.crew),
            (self.color, &mut input.color),
            (self.finish, &mut input.finish),
            (self.rarity, &mut input.rarity),
            (self.kind, &mut input.kind),
            (self.special_power, &mut input.special_power),
            (self.notes, &mut input.notes),
        ];
        for (value, slot) in targets {
            if let Some(value) = value {
                *slot = value;
            }
        }
        if let Some(alt_art) = self.alt_art {
            input.alt_art = alt_art;
        }
    }
}

/// Field constraints for views
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only this colour
    #[arg(long)]
    pub color: Option<String>,
    /// Only this rarity
    #[arg(long)]
    pub rarity: Option<String>,
    /// Only this kind
    #[arg(long)]
    pub kind: Option<String>,
    /// Only this finish
    #[arg(long)]
    pub finish: Option<String>,
    /// Only alternate-art cards
    #[arg(long)]
    pub alt_art: bool,
}

impl FilterArgs {
    pub fn into_filter(self, term: Option<String>) -> Filter {
        Filter::term(term.unwrap_or_default()).with_constraints(Constraints {
            color: self.color,
            rarity: self.rarity,
            kind: self.kind,
            finish: self.finish,
            alt_art_only: self.alt_art,
        })
    }
}

/// How to treat a card that matches an existing one
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct PolicyArgs {
    /// Add the quantity to the matching card
    #[arg(long, conflicts_with = "separate")]
    pub merge: bool,
    /// Keep the new card as its own row
    #[arg(long)]
    pub separate: bool,
}

impl PolicyArgs {
    /// Policy chosen with flags, if any
    pub fn policy(&self) -> Option<DuplicatePolicy> {
        if self.merge {
            Some(DuplicatePolicy::Merge)
        } else if self.separate {
            Some(DuplicatePolicy::KeepSeparate)
        } else {
            None
        }
    }
}
