//! TF-IDF weighting over word n-grams.
//!
//! Mirrors scikit-learn's `TfidfVectorizer` defaults: lowercase tokens of two
//! or more word characters, raw counts, smooth idf `ln((1+n)/(1+df)) + 1` and
//! L2-normalised rows.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid regex"));

/// Vectorizer parameters.
#[derive(Debug, Clone, Copy)]
pub struct TfidfVectorizer {
    /// Smallest and largest n-gram size, inclusive.
    pub ngram_range: (usize, usize),
    /// Terms must appear in at least this many documents.
    pub min_df: usize,
    /// Terms appearing in more than this share of documents are dropped.
    pub max_df: f64,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self {
            ngram_range: (1, 2),
            min_df: 2,
            max_df: 0.99,
        }
    }
}

/// Vocabulary and idf weights learned by [`TfidfVectorizer::fit`].
#[derive(Debug, Clone)]
pub struct FittedTfidf {
    params: TfidfVectorizer,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    fn terms(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = TOKEN.find_iter(&lower).map(|m| m.as_str()).collect();
        let (lo, hi) = self.ngram_range;
        let mut terms = Vec::new();
        for n in lo.max(1)..=hi {
            if n > tokens.len() {
                break;
            }
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    /// Learn the pruned vocabulary and idf weights from `documents`.
    pub fn fit<S: AsRef<str>>(&self, documents: &[S]) -> FittedTfidf {
        let n_docs = documents.len();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let unique: HashSet<String> = self.terms(doc.as_ref()).into_iter().collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let max_count = self.max_df * n_docs as f64;
        let mut kept: Vec<(String, usize)> = doc_freq
            .into_iter()
            .filter(|(_, df)| *df >= self.min_df && (*df as f64) <= max_count)
            .collect();
        kept.sort_by(|a, b| a.0.cmp(&b.0));

        let mut vocabulary = HashMap::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());
        for (idx, (term, df)) in kept.into_iter().enumerate() {
            idf.push(((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() + 1.0);
            vocabulary.insert(term, idx);
        }
        FittedTfidf {
            params: *self,
            vocabulary,
            idf,
        }
    }
}

impl FittedTfidf {
    pub fn vocabulary_len(&self) -> usize {
        self.idf.len()
    }

    /// Sparse L2-normalised weights of `text`, keyed by feature index.
    pub fn transform(&self, text: &str) -> Vec<(usize, f64)> {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in self.params.terms(text) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }
        let mut weights: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();
        weights.sort_by_key(|(idx, _)| *idx);
        let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut weights {
                *w /= norm;
            }
        }
        weights
    }

    /// Mean weight over the whole vocabulary; zero for out-of-vocabulary text.
    pub fn mean_weight(&self, text: &str) -> f64 {
        if self.idf.is_empty() {
            return 0.0;
        }
        let total: f64 = self.transform(text).iter().map(|(_, w)| w).sum();
        total / self.idf.len() as f64
    }
}

/// Percentile with linear interpolation between closest ranks.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}
