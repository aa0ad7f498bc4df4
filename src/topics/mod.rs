//! Topic assignment from a trained topic model.

pub mod corpus;
pub mod lda;

use std::path::Path;

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::{data::speeches::SpeechTable, error::PipelineError};

pub use corpus::{Bow, Dictionary};
pub use lda::LdaModel;

/// Dense per-document probability vector indexed by topic id.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicDistribution(Vec<f32>);

impl TopicDistribution {
    pub fn new(probs: Vec<f32>) -> Self {
        Self(probs)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Probability of `topic`, zero when out of range.
    pub fn prob(&self, topic: usize) -> f32 {
        self.0.get(topic).copied().unwrap_or(0.0)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Topic with the highest probability.
    pub fn dominant(&self) -> Option<usize> {
        self.0
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(idx, _)| idx)
    }
}

/// Anything that turns a bag of words into a distribution over topics.
pub trait TopicModel {
    fn num_topics(&self) -> usize;

    /// Probability for every topic; topics the document does not cover get 0.
    fn document_topics(&self, bow: &[(usize, f64)]) -> Vec<f64>;
}

/// Whether topic assignment can run yet.
pub enum TopicSource {
    Ready {
        model: Box<dyn TopicModel>,
        corpus: Vec<Bow>,
    },
    /// No trained model exists yet; assignment passes tables through.
    Pending,
}

impl TopicSource {
    /// Load the model and corpus if the model artefact exists.
    pub fn from_paths(model_path: &Path, corpus_path: &Path) -> Result<Self> {
        if !model_path.exists() {
            return Ok(Self::Pending);
        }
        let model = LdaModel::load(model_path)?;
        let corpus = corpus::read_matrix_market(corpus_path)?;
        info!(
            topics = model.num_topics(),
            documents = corpus.len(),
            "loaded topic model and corpus"
        );
        Ok(Self::Ready {
            model: Box::new(model),
            corpus,
        })
    }

    /// Run assignment, or log and pass through when no model is available.
    pub fn apply(&self, table: SpeechTable) -> Result<SpeechTable, PipelineError> {
        match self {
            Self::Ready { model, corpus } => assign_topics(table, model.as_ref(), corpus),
            Self::Pending => {
                warn!("no topic model found; skipping topic assignment until a model is trained");
                Ok(table)
            }
        }
    }
}

/// Attach a topic distribution to every record.
///
/// `corpus[i]` must be the bag of words of the `i`-th record.
#[instrument(skip_all, fields(rows = table.len(), corpus = corpus.len()))]
pub fn assign_topics(
    table: SpeechTable,
    model: &dyn TopicModel,
    corpus: &[Bow],
) -> Result<SpeechTable, PipelineError> {
    if table.len() != corpus.len() {
        return Err(PipelineError::CorpusMisaligned {
            rows: table.len(),
            corpus: corpus.len(),
        });
    }
    let n_topics = model.num_topics();
    let mut docs = corpus.iter();
    table.try_map(|mut record| {
        let bow = docs.next().map(Vec::as_slice).unwrap_or_default();
        let probs = model.document_topics(bow);
        if probs.len() != n_topics {
            return Err(PipelineError::DimensionMismatch {
                expected: n_topics,
                found: probs.len(),
            });
        }
        record.topics = Some(TopicDistribution::new(
            probs.into_iter().map(|p| p as f32).collect(),
        ));
        Ok(record)
    })
}

/// Keep speeches whose probability on `topic` reaches `threshold`.
///
/// The retained records carry `migration_prob` instead of the full vector.
#[instrument(skip(table), fields(rows = table.len()))]
pub fn migration_subset(
    table: &SpeechTable,
    topic: usize,
    threshold: f32,
) -> Result<SpeechTable, PipelineError> {
    let mut subset = Vec::new();
    for record in table.iter() {
        let Some(dist) = &record.topics else {
            return Err(PipelineError::EmptyInput("speeches have no topic probabilities"));
        };
        if topic >= dist.len() {
            return Err(PipelineError::TopicOutOfRange {
                topic,
                n_topics: dist.len(),
            });
        }
        let prob = dist.prob(topic);
        if prob >= threshold {
            let mut kept = record.clone();
            kept.topics = None;
            kept.migration_prob = Some(prob);
            subset.push(kept);
        }
    }
    info!(kept = subset.len(), threshold, "selected topic subset");
    Ok(SpeechTable::new(subset))
}

/// Indices of the `n` records with the highest probability on `topic`.
pub fn top_speeches(table: &SpeechTable, topic: usize, n: usize) -> Vec<usize> {
    let mut scored: Vec<(usize, f32)> = table
        .iter()
        .enumerate()
        .filter_map(|(idx, r)| r.topics.as_ref().map(|t| (idx, t.prob(topic))))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.into_iter().take(n).map(|(idx, _)| idx).collect()
}
