//! Party consolidation, ideological blocks and year/agenda derivation.
//!
//! Groupings follow W. Kaiser and J. Mittag, "Seventy years of transnational
//! political groups in the European Parliament", EPRS, January 2023.

use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{data::speeches::SpeechTable, error::PipelineError};

/// Six coarse ideological groupings of EP political groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Block {
    Left,
    Green,
    SocialDemocratic,
    ChristianConservative,
    Liberal,
    ExtremeRight,
}

impl Block {
    pub const ALL: [Block; 6] = [
        Block::Left,
        Block::Green,
        Block::SocialDemocratic,
        Block::ChristianConservative,
        Block::Liberal,
        Block::ExtremeRight,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Block::Left => "left",
            Block::Green => "green",
            Block::SocialDemocratic => "social_democratic",
            Block::ChristianConservative => "christian_conservative",
            Block::Liberal => "liberal",
            Block::ExtremeRight => "(extreme)_right",
        }
    }

    pub fn from_label(label: &str) -> Result<Self, PipelineError> {
        Block::ALL
            .into_iter()
            .find(|block| block.label() == label)
            .ok_or_else(|| PipelineError::UnknownBlock(label.to_string()))
    }
}

const BLOCK_TABLE: &[(&str, Block)] = &[
    ("GUE/NGL", Block::Left),
    ("The Left", Block::Left),
    ("NGL/The Left", Block::Left),
    ("Greens/EFA", Block::Green),
    ("PSE", Block::SocialDemocratic),
    ("S&D", Block::SocialDemocratic),
    ("PSE/S&D", Block::SocialDemocratic),
    ("PPE-DE", Block::ChristianConservative),
    ("PPE", Block::ChristianConservative),
    ("ELDR", Block::Liberal),
    ("ALDE", Block::Liberal),
    ("Renew", Block::Liberal),
    ("ELDR/ALDE/Renew", Block::Liberal),
    ("EFDD", Block::ExtremeRight),
    ("EFD", Block::ExtremeRight),
    ("ITS", Block::ExtremeRight),
    ("ENF", Block::ExtremeRight),
    ("ID", Block::ExtremeRight),
    ("ENF/ID", Block::ExtremeRight),
    ("IND/DEM", Block::ExtremeRight),
    ("EDD/INDDEM/EFD", Block::ExtremeRight),
    ("ECR", Block::ExtremeRight),
    ("UEN", Block::ExtremeRight),
    ("EDD", Block::ExtremeRight),
];

/// Groups renamed or merged over time, raw codes first, canonical code last.
const CONSOLIDATION_TABLE: &[(&[&str], &str)] = &[
    (&["PSE", "S&D"], "PSE/S&D"),
    (&["PPE-DE", "PPE"], "PPE"),
    (&["EDD", "IND/DEM", "EFDD", "EFD"], "EDD/INDDEM/EFD"),
    (&["ENF", "ID"], "ENF/ID"),
    (&["ELDR", "ALDE", "Renew"], "ELDR/ALDE/Renew"),
    (&["GUE/NGL", "The Left"], "NGL/The Left"),
    (&["Greens/EFA"], "Greens/EFA"),
    (&["UEN"], "UEN"),
    (&["ECR"], "ECR"),
    (&["ITS"], "ITS"),
];

static BLOCKS: Lazy<HashMap<&'static str, Block>> =
    Lazy::new(|| BLOCK_TABLE.iter().copied().collect());

static CANONICAL: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    CONSOLIDATION_TABLE
        .iter()
        .flat_map(|(raw_codes, canonical)| raw_codes.iter().map(move |code| (*code, *canonical)))
        .collect()
});

/// Block of a party code, if the exact code is registered.
pub fn block_for(party: &str) -> Option<Block> {
    BLOCKS.get(party).copied()
}

/// Canonical code of a raw party code, if the exact code is registered.
pub fn canonical_party(party: &str) -> Option<&'static str> {
    CANONICAL.get(party).copied()
}

/// Calendar year of an ISO-prefixed date string.
pub fn derive_year(date: &str) -> Result<i32, PipelineError> {
    let trimmed = date.trim();
    if let Some(day) = trimmed.get(..10) {
        if let Ok(parsed) = NaiveDate::parse_from_str(day, "%Y-%m-%d") {
            return Ok(parsed.year());
        }
    }
    trimmed
        .get(..4)
        .and_then(|prefix| prefix.parse::<i32>().ok())
        .ok_or_else(|| PipelineError::InvalidDate(date.to_string()))
}

fn unmapped<F>(table: &SpeechTable, known: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    table
        .iter()
        .map(|r| r.party.as_str())
        .filter(|party| !known(party))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Derive `year`, make `agenda` unique by appending the date, assign `block`.
///
/// Fails before touching any record when a party code has no block.
#[instrument(skip_all, fields(rows = table.len()))]
pub fn add_block_year_agenda(table: SpeechTable) -> Result<SpeechTable, PipelineError> {
    let missing = unmapped(&table, |party| block_for(party).is_some());
    if !missing.is_empty() {
        return Err(PipelineError::UnmappedParty(missing));
    }
    table.try_map(|mut record| {
        record.year = Some(derive_year(&record.date)?);
        record.agenda = format!("{}{}", record.agenda, record.date);
        record.block = block_for(&record.party);
        Ok(record)
    })
}

/// Collapse historical party codes into one code per political group.
#[instrument(skip_all, fields(rows = table.len()))]
pub fn consolidate_parties(table: SpeechTable) -> Result<SpeechTable, PipelineError> {
    let missing = unmapped(&table, |party| canonical_party(party).is_some());
    if !missing.is_empty() {
        return Err(PipelineError::UnknownPartyCode(missing));
    }
    let mut renamed = 0usize;
    let table = table.try_map(|mut record| {
        if let Some(canonical) = canonical_party(&record.party) {
            if record.party != canonical {
                renamed += 1;
                record.party = canonical.to_string();
            }
        }
        Ok(record)
    })?;
    info!(renamed, "consolidated party codes");
    Ok(table)
}
