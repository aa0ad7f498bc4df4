//! Canonical keys for free-text names, party labels and vocabulary words.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Lenient key: NFKC, collapsed whitespace, case-folded. `None` for empty input.
pub fn normalize_name(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let composed: String = trimmed.nfkc().collect();
    let collapsed = WHITESPACE.replace_all(&composed, " ");
    Some(collapsed.to_lowercase())
}

/// Lowercase, trim and drop diacritics, leaving everything else in place.
pub fn normalize_str(value: &str) -> String {
    strip_diacritics(value.trim().to_lowercase().as_str())
}

/// Strict matching key reduced to `[a-z0-9]`.
///
/// "Jiří POSPÍŠIL" and "Jíri Pospísíl" both become `jiripospisil`. With
/// `transliterate` set, Greek and Cyrillic names are romanised first so they
/// survive the final ASCII filter.
pub fn normalize_name_strict(value: Option<&str>, transliterate: bool) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut key: String = trimmed.nfkc().collect::<String>().to_lowercase();
    if transliterate {
        key = deunicode::deunicode(&key).to_lowercase();
    }
    let key: String = strip_diacritics(&key)
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

fn strip_diacritics(value: &str) -> String {
    value.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}
