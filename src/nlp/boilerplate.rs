//! Removal of generic opening and closing sentences.
//!
//! A sentence is considered boilerplate when its mean TF-IDF weight falls in
//! the lowest percentile of all opening (or closing) sentences of the corpus.
//! The cut-off is corpus-relative and recomputed on every run.

use tracing::{info, instrument, warn};

use crate::{
    data::speeches::SpeechTable,
    nlp::{
        sentences::split_sentences,
        tfidf::{percentile, TfidfVectorizer},
    },
};

pub const GREETING_PERCENTILE: f64 = 6.2;
pub const ENDING_PERCENTILE: f64 = 4.2;

/// Which sentence of a speech is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    First,
    Last,
}

/// Sentences the TF-IDF model is fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitCorpus {
    /// Only the scored sentence of every speech.
    #[default]
    EdgeSentences,
    /// Every sentence of every speech.
    AllSentences,
}

#[derive(Debug, Clone)]
pub struct BoilerplateTrimmer {
    pub edge: Edge,
    pub percentile: f64,
    pub fit_corpus: FitCorpus,
    pub vectorizer: TfidfVectorizer,
}

impl BoilerplateTrimmer {
    pub fn greetings() -> Self {
        Self {
            edge: Edge::First,
            percentile: GREETING_PERCENTILE,
            fit_corpus: FitCorpus::default(),
            vectorizer: TfidfVectorizer::default(),
        }
    }

    pub fn endings() -> Self {
        Self {
            edge: Edge::Last,
            percentile: ENDING_PERCENTILE,
            fit_corpus: FitCorpus::default(),
            vectorizer: TfidfVectorizer::default(),
        }
    }

    pub fn with_percentile(mut self, percentile: f64) -> Self {
        self.percentile = percentile;
        self
    }

    pub fn with_fit_corpus(mut self, fit_corpus: FitCorpus) -> Self {
        self.fit_corpus = fit_corpus;
        self
    }

    fn edge_sentence<'a>(&self, sentences: &[&'a str]) -> &'a str {
        let picked = match self.edge {
            Edge::First => sentences.first(),
            Edge::Last => sentences.last(),
        };
        picked.copied().unwrap_or("")
    }

    fn without_edge(&self, sentences: &[&str]) -> String {
        let rest = match self.edge {
            Edge::First => sentences.get(1..),
            Edge::Last => sentences.len().checked_sub(1).map(|end| &sentences[..end]),
        };
        rest.unwrap_or_default().join(" ")
    }

    /// Score edge sentences and drop those at or below the percentile cut-off.
    #[instrument(skip(self, table), fields(edge = ?self.edge, rows = table.len()))]
    pub fn apply(&self, table: SpeechTable) -> SpeechTable {
        let mut records = drop_empty(table, "before trimming").into_records();
        if records.is_empty() {
            return SpeechTable::new(records);
        }

        let sentence_lists: Vec<Vec<&str>> = records
            .iter()
            .map(|r| split_sentences(&r.translated_text))
            .collect();
        let edges: Vec<&str> = sentence_lists
            .iter()
            .map(|sentences| self.edge_sentence(sentences))
            .collect();

        let fit_docs: Vec<&str> = match self.fit_corpus {
            FitCorpus::EdgeSentences => edges.iter().copied().filter(|s| !s.is_empty()).collect(),
            FitCorpus::AllSentences => sentence_lists.iter().flatten().copied().collect(),
        };
        let tfidf = self.vectorizer.fit(&fit_docs);
        if tfidf.vocabulary_len() == 0 {
            warn!(
                sentences = fit_docs.len(),
                "no terms survive document-frequency pruning; leaving speeches untouched"
            );
            return SpeechTable::new(records);
        }

        let scores: Vec<f64> = edges.iter().map(|s| tfidf.mean_weight(s)).collect();
        let Some(cut_off) = percentile(&scores, self.percentile) else {
            return SpeechTable::new(records);
        };

        let replacements: Vec<Option<String>> = sentence_lists
            .iter()
            .zip(&scores)
            .map(|(sentences, score)| (*score <= cut_off).then(|| self.without_edge(sentences)))
            .collect();
        let trimmed = replacements.iter().filter(|r| r.is_some()).count();
        info!(
            trimmed,
            cut_off,
            percentile = self.percentile,
            vocabulary = tfidf.vocabulary_len(),
            "removed generic edge sentences"
        );

        for (record, replacement) in records.iter_mut().zip(replacements) {
            if let Some(text) = replacement {
                record.translated_text = text;
            }
        }
        drop_empty(SpeechTable::new(records), "after trimming")
    }
}

/// Trim translated text and drop speeches left empty.
fn drop_empty(table: SpeechTable, stage: &str) -> SpeechTable {
    let before = table.len();
    let table: SpeechTable = table
        .into_records()
        .into_iter()
        .filter_map(|mut r| {
            let trimmed = r.translated_text.trim();
            if trimmed.is_empty() {
                return None;
            }
            if trimmed.len() != r.translated_text.len() {
                r.translated_text = trimmed.to_string();
            }
            Some(r)
        })
        .collect();
    let removed = before - table.len();
    if removed > 0 {
        info!(removed, stage, "dropped empty speeches");
    }
    table
}
