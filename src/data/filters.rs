//! Row filters applied before any text cleaning.

use std::collections::HashSet;

use tracing::{info, instrument};

use crate::data::speeches::SpeechTable;

/// Speakers without a political group: the chair ("-"), non-attached
/// members ("NI") and the technical group of independents ("TGI").
pub const NON_PARTY_CODES: &[&str] = &["-", "NI", "TGI"];

/// Legislative periods covered by the study.
pub const DEFAULT_PERIODS: &[i64] = &[8, 9];

fn log_delta(filter: &str, before: usize, after: usize) {
    info!(filter, before, after, removed = before - after, "applied filter");
}

/// Keep only speeches from the allowed legislative periods.
#[instrument(skip(table), fields(rows = table.len()))]
pub fn keep_periods(table: SpeechTable, allowed: &[i64]) -> SpeechTable {
    let before = table.len();
    let table = table.retain(|r| allowed.contains(&r.period));
    log_delta("keep_periods", before, table.len());
    table
}

/// Drop every speech whose `text` repeats an earlier speech verbatim.
#[instrument(skip(table), fields(rows = table.len()))]
pub fn drop_duplicate_text(table: SpeechTable) -> SpeechTable {
    let before = table.len();
    let mut seen = HashSet::with_capacity(before);
    let table: SpeechTable = table
        .into_records()
        .into_iter()
        .filter(|r| seen.insert(r.text.clone()))
        .collect();
    log_delta("drop_duplicate_text", before, table.len());
    table
}

/// Drop speeches whose speaker belongs to one of the `excluded` codes.
#[instrument(skip(table), fields(rows = table.len()))]
pub fn drop_non_party(table: SpeechTable, excluded: &[&str]) -> SpeechTable {
    let before = table.len();
    let table = table.retain(|r| !excluded.contains(&r.party.as_str()));
    log_delta("drop_non_party", before, table.len());
    table
}
