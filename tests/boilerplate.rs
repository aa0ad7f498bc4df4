use parl_discourse::{
    data::speeches::{SpeechRecord, SpeechTable},
    nlp::{
        boilerplate::{BoilerplateTrimmer, FitCorpus},
        sentences::split_sentences,
        tfidf::{percentile, TfidfVectorizer},
    },
};

fn table(texts: &[&str]) -> SpeechTable {
    texts
        .iter()
        .map(|t| SpeechRecord::new(*t, *t, "PPE", "2019-07-02", 9))
        .collect()
}

#[test]
fn percentile_interpolates_linearly() {
    let values = [4.0, 1.0, 3.0, 2.0];
    assert_eq!(percentile(&values, 50.0), Some(2.5));
    assert_eq!(percentile(&values, 0.0), Some(1.0));
    assert_eq!(percentile(&values, 100.0), Some(4.0));
    assert_eq!(percentile(&[], 10.0), None);
}

#[test]
fn vocabulary_respects_document_frequency_bounds() {
    let docs = ["the cat sat", "the cat ran", "a dog barked"];
    let fitted = TfidfVectorizer::default().fit(&docs);
    // "the", "cat" and "the cat" appear in two of three documents
    assert_eq!(fitted.vocabulary_len(), 3);
    assert_eq!(fitted.mean_weight("a dog barked"), 0.0);

    let weights = fitted.transform("the cat");
    let norm: f64 = weights.iter().map(|(_, w)| w * w).sum();
    assert!((norm - 1.0).abs() < 1e-12);
}

#[test]
fn sentences_are_split_and_trimmed() {
    let sentences = split_sentences("Madam President, colleagues. Asylum matters!  Thank you.");
    assert_eq!(
        sentences,
        vec!["Madam President, colleagues.", "Asylum matters!", "Thank you."]
    );
}

#[test]
fn generic_openings_are_trimmed() {
    let texts = [
        "Madam President, dear colleagues. Border controls need reform.",
        "Madam President, dear colleagues. Asylum procedures take too long.",
        "Madam President, dear colleagues. Frontex needs a clear mandate.",
        "Madam President, dear colleagues. Integration starts with language.",
        "Xylophones zebras quietly. Migration policy matters.",
    ];
    let out = BoilerplateTrimmer::greetings().apply(table(&texts));
    assert_eq!(out.len(), texts.len());
    assert_eq!(out.records()[4].translated_text, "Migration policy matters.");
    for (record, original) in out.iter().zip(&texts).take(4) {
        assert_eq!(record.translated_text, *original);
    }
}

#[test]
fn fitting_on_all_sentences_still_finds_unique_openings() {
    let texts = [
        "Madam President, dear colleagues. Border controls need reform.",
        "Madam President, dear colleagues. Asylum procedures take too long.",
        "Madam President, dear colleagues. Frontex needs a clear mandate.",
        "Xylophones zebras quietly. Migration policy matters.",
    ];
    let out = BoilerplateTrimmer::greetings()
        .with_fit_corpus(FitCorpus::AllSentences)
        .apply(table(&texts));
    assert_eq!(out.records()[3].translated_text, "Migration policy matters.");
    assert_eq!(out.records()[0].translated_text, texts[0]);
}

#[test]
fn generic_closings_are_trimmed() {
    let texts = [
        "Border controls need reform. Thank you very much.",
        "Asylum procedures take too long. Thank you very much.",
        "Frontex needs a clear mandate. Thank you very much.",
        "Integration starts with language. Thank you very much.",
        "Migration policy matters. Xylophones zebras quietly.",
    ];
    let out = BoilerplateTrimmer::endings().apply(table(&texts));
    assert_eq!(out.records()[4].translated_text, "Migration policy matters.");
    assert_eq!(out.records()[0].translated_text, texts[0]);
}

#[test]
fn tiny_corpus_without_shared_terms_is_untouched() {
    let texts = ["Alpha beta. Gamma delta.", "Epsilon zeta. Eta theta."];
    let out = BoilerplateTrimmer::greetings().apply(table(&texts));
    let kept: Vec<&str> = out.iter().map(|r| r.translated_text.as_str()).collect();
    assert_eq!(kept, texts.to_vec());
}

#[test]
fn speeches_emptied_by_trimming_are_dropped() {
    let texts = [
        "Dear colleagues, thank you.",
        "Dear colleagues, thank you. Asylum matters.",
        "Dear colleagues, thank you. Borders matter.",
        "Nothing shared here.",
    ];
    let out = BoilerplateTrimmer::greetings().apply(table(&texts));
    assert!(out.iter().all(|r| !r.translated_text.is_empty()));
    assert!(out.len() < texts.len());
}

#[test]
fn honorifics_do_not_end_a_sentence() {
    assert_eq!(
        split_sentences("Mr. President, I welcome this report. We must act."),
        vec!["Mr. President, I welcome this report.", "We must act."]
    );
    assert_eq!(
        split_sentences("Under Art. 78 and Rule No. 5 we act. Mrs. Smith agrees."),
        vec!["Under Art. 78 and Rule No. 5 we act.", "Mrs. Smith agrees."]
    );
    assert_eq!(split_sentences("Thank you, Mr."), vec!["Thank you, Mr."]);
}

#[test]
fn honorific_greetings_are_trimmed_whole() {
    let substantive = "Border agencies should coordinate rescue missions across every \
                       Mediterranean port without delay. We must act.";
    let texts = [
        "Mr. President, I welcome this report. We must act on asylum.",
        "Mr. President, I welcome this report. Frontex needs a clear mandate.",
        "Mr. President, I welcome this report. Integration starts with language.",
        "Mr. President, I welcome this report. Returns must be humane.",
        substantive,
        substantive,
    ];
    let out = BoilerplateTrimmer::greetings().apply(table(&texts));
    let kept: Vec<&str> = out.iter().map(|r| r.translated_text.as_str()).collect();
    assert_eq!(
        kept,
        vec![
            "We must act on asylum.",
            "Frontex needs a clear mandate.",
            "Integration starts with language.",
            "Returns must be humane.",
            substantive,
            substantive,
        ]
    );
}
