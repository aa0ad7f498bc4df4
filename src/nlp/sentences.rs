//! Sentence splitting on Unicode sentence boundaries.
//!
//! UAX #29 breaks after any full stop followed by an uppercase word, so
//! honorifics such as "Mr. President" are glued back to the next segment.

use unicode_segmentation::UnicodeSegmentation;

/// Lowercased abbreviations that never end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "no", "nos", "nr", "art", "arts",
    "para", "cf", "vs", "e.g", "i.e", "approx", "dept", "gen", "gov", "hon", "rev", "sen", "rep",
];

fn ends_with_abbreviation(segment: &str) -> bool {
    let Some(stem) = segment.trim_end().strip_suffix('.') else {
        return false;
    };
    let last = stem
        .rsplit(|c: char| c.is_whitespace() || c == '(' || c == '[' || c == '"')
        .next()
        .unwrap_or(stem);
    !last.is_empty() && ABBREVIATIONS.contains(&last.to_lowercase().as_str())
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, sentence: &'a str) {
    let sentence = sentence.trim();
    if !sentence.is_empty() {
        sentences.push(sentence);
    }
}

/// Split text into trimmed, non-empty sentences.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut pending: Option<usize> = None;
    for (offset, segment) in text.split_sentence_bound_indices() {
        let start = *pending.get_or_insert(offset);
        if ends_with_abbreviation(segment) {
            continue;
        }
        pending = None;
        push_trimmed(&mut sentences, &text[start..offset + segment.len()]);
    }
    if let Some(start) = pending {
        push_trimmed(&mut sentences, &text[start..]);
    }
    sentences
}
