//! Removal of bracketed transcript annotations such as "(Applause)" or
//! "[The speaker switched off the microphone]".

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, instrument};

use crate::data::speeches::SpeechTable;

static SPEAKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)speaker|\bmeps?\b").expect("valid regex"));
static MICROPHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)microphone|\bmic\b").expect("valid regex"));
static BOILERPLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)applause|rule 1|speaking session").expect("valid regex"));

const INLINE_SPACE: &[char] = &[' ', '\t'];
const CLOSING_PUNCT: &[char] = &['.', ',', ';', ':', '!', '?'];

const REPEATING_PREFIXES: &[&str] = &[
    "parliament",
    "the parliament",
    "the sitting",
    "the mep",
    "the president",
    "end of",
    "the oral amendment",
    "explanation of vote",
    "article",
    "rule",
];

/// Why a bracketed span is treated as removable commentary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentaryKind {
    Speaker,
    Microphone,
    Short,
    RepeatingPrefix,
    Boilerplate,
}

/// Contents of every outermost `open … close` pair, nested pairs included.
///
/// "See (note (inner) here) please" yields only `note (inner) here`.
pub fn extract_brackets(text: &str, open: char, close: char) -> Vec<&str> {
    let mut stack = Vec::new();
    let mut spans = Vec::new();
    for (idx, ch) in text.char_indices() {
        if ch == open {
            stack.push(idx);
        } else if ch == close {
            if let Some(start) = stack.pop() {
                if stack.is_empty() {
                    spans.push(&text[start + open.len_utf8()..idx]);
                }
            }
        }
    }
    spans
}

/// Round and square bracket spans of `text`.
pub fn extract_commentary(text: &str) -> Vec<&str> {
    let mut spans = extract_brackets(text, '(', ')');
    spans.extend(extract_brackets(text, '[', ']'));
    spans
}

/// Classify a span. `occurrences` is how often it appears in the corpus;
/// spans seen only once are kept unless they address the chair or mic.
pub fn classify(span: &str, occurrences: usize) -> Option<CommentaryKind> {
    if SPEAKER.is_match(span) {
        return Some(CommentaryKind::Speaker);
    }
    if MICROPHONE.is_match(span) {
        return Some(CommentaryKind::Microphone);
    }
    if occurrences <= 1 {
        return None;
    }
    if span.split_whitespace().count() <= 2 {
        return Some(CommentaryKind::Short);
    }
    if BOILERPLATE.is_match(span) {
        return Some(CommentaryKind::Boilerplate);
    }
    let lower = span.trim_start().to_lowercase();
    if REPEATING_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return Some(CommentaryKind::RepeatingPrefix);
    }
    None
}

/// Cut every `needle` out of `text`, closing each gap with at most one space.
///
/// Whitespace is only touched on either side of a removed occurrence.
fn cut(text: &str, needle: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(needle) {
        out.push_str(&rest[..pos]);
        let kept = out.trim_end_matches(INLINE_SPACE).len();
        out.truncate(kept);
        rest = rest[pos + needle.len()..].trim_start_matches(INLINE_SPACE);
        let glued = out.is_empty()
            || rest.is_empty()
            || out.ends_with(char::is_whitespace)
            || rest.starts_with(char::is_whitespace)
            || rest.starts_with(CLOSING_PUNCT);
        if !glued {
            out.push(' ');
        }
    }
    out.push_str(rest);
    out
}

/// Delete `(span)` and `[span]` for every span, tidying only the gaps left behind.
pub fn remove_spans<S: AsRef<str>>(original: &str, spans: &[S]) -> String {
    let mut text = original.to_string();
    for span in spans {
        let span = span.as_ref();
        for needle in [format!("({span})"), format!("[{span}]")] {
            if text.contains(&needle) {
                text = cut(&text, &needle);
            }
        }
    }
    text
}

/// Strip removable commentary from the translated text of every speech.
#[instrument(skip_all, fields(rows = table.len()))]
pub fn strip_commentary(table: SpeechTable) -> SpeechTable {
    let spans: Vec<Vec<String>> = table
        .iter()
        .map(|r| {
            extract_commentary(&r.translated_text)
                .into_iter()
                .map(str::to_string)
                .collect()
        })
        .collect();

    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for span in spans.iter().flatten() {
        *occurrences.entry(span.as_str()).or_insert(0) += 1;
    }

    let mut by_kind: HashMap<CommentaryKind, usize> = HashMap::new();
    let mut residual = 0usize;
    let removable: Vec<Vec<&str>> = spans
        .iter()
        .map(|doc_spans| {
            doc_spans
                .iter()
                .filter(|span| {
                    let count = occurrences.get(span.as_str()).copied().unwrap_or(0);
                    match classify(span, count) {
                        Some(kind) => {
                            *by_kind.entry(kind).or_insert(0) += 1;
                            true
                        }
                        None => {
                            residual += 1;
                            false
                        }
                    }
                })
                .map(String::as_str)
                .collect()
        })
        .collect();

    let found: usize = spans.iter().map(Vec::len).sum();
    info!(found, residual, removable = ?by_kind, "classified bracketed commentary");

    table
        .into_records()
        .into_iter()
        .zip(removable)
        .map(|(mut record, doc_spans)| {
            if !doc_spans.is_empty() {
                record.translated_text = remove_spans(&record.translated_text, &doc_spans);
            }
            record
        })
        .collect()
}
