//! Vocabulary extraction used to label projection axes.

use std::collections::BTreeSet;

use crate::{data::speeches::SpeechTable, nlp::normalize::normalize_name_strict};

/// Distinct normalized words of the translated speeches, sorted.
pub fn vocabulary(table: &SpeechTable) -> Vec<String> {
    table
        .iter()
        .flat_map(|r| r.translated_text.split_whitespace())
        .filter_map(|word| normalize_name_strict(Some(word), true))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
