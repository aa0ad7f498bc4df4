//! Latent Dirichlet Allocation model loaded from a trained artefact.
//!
//! Inference is the variational E-step used by gensim's `get_document_topics`:
//! document-level `gamma` is iterated against the fixed `exp(E[log beta])`
//! until its mean absolute change drops below `GAMMA_THRESHOLD`.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::PipelineError,
    topics::{corpus::Dictionary, TopicModel},
};

const MAX_ITERATIONS: usize = 50;
const GAMMA_THRESHOLD: f64 = 1e-3;
const MINIMUM_PROBABILITY: f64 = 1e-8;

/// On-disk layout of a trained model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdaArtifact {
    pub num_topics: usize,
    /// Document-topic Dirichlet prior, one entry per topic.
    pub alpha: Vec<f64>,
    /// Token for every vocabulary id.
    pub vocabulary: Vec<String>,
    /// Variational topic-word parameters, `num_topics` rows of vocabulary length.
    pub lambda: Vec<Vec<f64>>,
}

/// Read-only trained topic model.
#[derive(Debug, Clone)]
pub struct LdaModel {
    alpha: Array1<f64>,
    lambda: Array2<f64>,
    exp_elogbeta: Array2<f64>,
    dictionary: Dictionary,
}

impl LdaModel {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening model {}", path.display()))?;
        let artifact: LdaArtifact = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing model {}", path.display()))?;
        Ok(Self::from_artifact(artifact)?)
    }

    pub fn from_artifact(artifact: LdaArtifact) -> Result<Self, PipelineError> {
        let LdaArtifact {
            num_topics,
            alpha,
            vocabulary,
            lambda,
        } = artifact;
        if num_topics == 0 {
            return Err(PipelineError::InvalidModel("model has no topics".into()));
        }
        if alpha.len() != num_topics || lambda.len() != num_topics {
            return Err(PipelineError::InvalidModel(format!(
                "expected {num_topics} topics, got {} alpha entries and {} lambda rows",
                alpha.len(),
                lambda.len()
            )));
        }
        let n_terms = vocabulary.len();
        let mut matrix = Array2::<f64>::zeros((num_topics, n_terms));
        for (topic, row) in lambda.iter().enumerate() {
            if row.len() != n_terms {
                return Err(PipelineError::DimensionMismatch {
                    expected: n_terms,
                    found: row.len(),
                });
            }
            if row.iter().any(|v| !(*v > 0.0)) {
                return Err(PipelineError::InvalidModel(format!(
                    "topic {topic} has non-positive lambda entries"
                )));
            }
            for (term, value) in row.iter().enumerate() {
                matrix[[topic, term]] = *value;
            }
        }
        let exp_elogbeta = dirichlet_expectation_rows(&matrix).mapv(f64::exp);
        debug!(num_topics, n_terms, "built topic model");
        Ok(Self {
            alpha: Array1::from(alpha),
            lambda: matrix,
            exp_elogbeta,
            dictionary: Dictionary::new(vocabulary),
        })
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Most probable `k` words of `topic` with their probabilities.
    pub fn top_words(&self, topic: usize, k: usize) -> Vec<(String, f64)> {
        if topic >= self.lambda.nrows() {
            return Vec::new();
        }
        let row = self.lambda.row(topic);
        let total = row.sum();
        let mut ranked: Vec<(usize, f64)> =
            row.iter().map(|v| v / total).enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
            .into_iter()
            .take(k)
            .filter_map(|(id, p)| self.dictionary.token(id).map(|t| (t.to_string(), p)))
            .collect()
    }

    fn infer_gamma(&self, bow: &[(usize, f64)]) -> Array1<f64> {
        let n_topics = self.alpha.len();
        let known: Vec<(usize, f64)> = bow
            .iter()
            .copied()
            .filter(|(id, _)| *id < self.exp_elogbeta.ncols())
            .collect();
        let ids: Vec<usize> = known.iter().map(|(id, _)| *id).collect();
        let counts = Array1::from_iter(known.iter().map(|(_, c)| *c));
        let beta_d = self.exp_elogbeta.select(Axis(1), &ids);

        let mut gamma = Array1::<f64>::ones(n_topics);
        let mut exp_elogtheta = dirichlet_expectation(&gamma).mapv(f64::exp);
        let mut phinorm = exp_elogtheta.dot(&beta_d) + 1e-100;
        for _ in 0..MAX_ITERATIONS {
            let last = gamma.clone();
            let ratio = &counts / &phinorm;
            gamma = &self.alpha + &(&exp_elogtheta * &beta_d.dot(&ratio));
            exp_elogtheta = dirichlet_expectation(&gamma).mapv(f64::exp);
            phinorm = exp_elogtheta.dot(&beta_d) + 1e-100;
            let change = (&gamma - &last).mapv(f64::abs).mean().unwrap_or(0.0);
            if change < GAMMA_THRESHOLD {
                break;
            }
        }
        gamma
    }
}

impl TopicModel for LdaModel {
    fn num_topics(&self) -> usize {
        self.alpha.len()
    }

    fn document_topics(&self, bow: &[(usize, f64)]) -> Vec<f64> {
        let gamma = self.infer_gamma(bow);
        let total = gamma.sum();
        gamma
            .iter()
            .map(|g| {
                let p = g / total;
                if p < MINIMUM_PROBABILITY {
                    0.0
                } else {
                    p
                }
            })
            .collect()
    }
}

/// `E[log x]` for `x ~ Dir(param)`.
fn dirichlet_expectation(param: &Array1<f64>) -> Array1<f64> {
    let total = digamma(param.sum());
    param.mapv(|v| digamma(v) - total)
}

fn dirichlet_expectation_rows(param: &Array2<f64>) -> Array2<f64> {
    let mut out = param.mapv(digamma);
    for (mut row, src) in out.outer_iter_mut().zip(param.outer_iter()) {
        let total = digamma(src.sum());
        row.mapv_inplace(|v| v - total);
    }
    out
}

/// Digamma function for positive arguments (recurrence + asymptotic series).
pub fn digamma(mut x: f64) -> f64 {
    let mut result = 0.0;
    while x < 6.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let inv = 1.0 / x;
    let inv2 = inv * inv;
    result + x.ln() - 0.5 * inv
        - inv2
            * (1.0 / 12.0
                - inv2 * (1.0 / 120.0 - inv2 * (1.0 / 252.0 - inv2 * (1.0 / 240.0 - inv2 / 132.0))))
}
