use parl_discourse::nlp::normalize::{normalize_name, normalize_name_strict, normalize_str};
use proptest::prelude::*;

#[test]
fn lenient_key_folds_case_and_whitespace() {
    assert_eq!(
        normalize_name(Some("  Greens/EFA \t ")).as_deref(),
        Some("greens/efa")
    );
    assert_eq!(normalize_name(Some("S&D")).as_deref(), Some("s&d"));
    assert_eq!(normalize_name(Some("   ")), None);
    assert_eq!(normalize_name(None), None);
}

#[test]
fn strict_key_drops_accents_and_punctuation() {
    assert_eq!(
        normalize_name_strict(Some("Jiří POSPÍŠIL"), false).as_deref(),
        Some("jiripospisil")
    );
    assert_eq!(
        normalize_name_strict(Some("Jíri Pospísíl"), false).as_deref(),
        Some("jiripospisil")
    );
    assert_eq!(normalize_name_strict(Some("!!!"), false), None);
}

#[test]
fn transliteration_keeps_non_latin_words() {
    assert_eq!(normalize_name_strict(Some("Αθήνα"), false), None);
    let key = normalize_name_strict(Some("Αθήνα"), true).unwrap();
    assert!(key.starts_with("ath"), "{key}");
}

#[test]
fn normalize_str_keeps_spacing() {
    assert_eq!(normalize_str("  Café Crème "), "cafe creme");
}

proptest! {
    #[test]
    fn strict_key_is_idempotent(input in "\\PC{0,24}") {
        if let Some(key) = normalize_name_strict(Some(&input), true) {
            prop_assert!(key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
            prop_assert_eq!(normalize_name_strict(Some(&key), true), Some(key.clone()));
        }
    }

    #[test]
    fn lenient_key_is_idempotent(input in "[A-Za-z/& -]{1,20}") {
        if let Some(key) = normalize_name(Some(&input)) {
            prop_assert_eq!(normalize_name(Some(&key)), Some(key.clone()));
        }
    }
}
