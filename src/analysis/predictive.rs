//! Cross-validated predictive power of a label from embeddings.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use linfa::{
    dataset::DatasetBase,
    prelude::{Fit, Predict},
};
use linfa_logistic::MultiLogisticRegression;
use ndarray::{Array1, Array2, Axis};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::{debug, info, instrument};

use crate::{analysis::encode_labels, error::PipelineError, nlp::tfidf::percentile};

pub const DEFAULT_FOLDS: usize = 10;
pub const DEFAULT_BINS: usize = 5;
const MAX_ITERATIONS: u64 = 1000;

/// Test-row indices of `k` folds that keep class proportions roughly equal.
pub fn stratified_folds(labels: &[usize], k: usize, seed: u64) -> Vec<Vec<usize>> {
    let k = k.max(1);
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(idx);
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut folds = vec![Vec::new(); k];
    let mut next = 0;
    for rows in by_class.values_mut() {
        rows.shuffle(&mut rng);
        for &row in rows.iter() {
            folds[next % k].push(row);
            next += 1;
        }
    }
    for fold in &mut folds {
        fold.sort_unstable();
    }
    folds
}

/// Unweighted mean F1 over every class seen in `truth` or `predicted`.
pub fn macro_f1(truth: &[usize], predicted: &[usize]) -> f64 {
    let classes: BTreeSet<usize> = truth.iter().chain(predicted).copied().collect();
    if classes.is_empty() {
        return 0.0;
    }
    let total: f64 = classes
        .iter()
        .map(|&c| {
            let mut tp = 0usize;
            let mut fp = 0usize;
            let mut fn_ = 0usize;
            for (&t, &p) in truth.iter().zip(predicted) {
                match (t == c, p == c) {
                    (true, true) => tp += 1,
                    (false, true) => fp += 1,
                    (true, false) => fn_ += 1,
                    (false, false) => {}
                }
            }
            let denom = 2 * tp + fp + fn_;
            if denom == 0 {
                0.0
            } else {
                2.0 * tp as f64 / denom as f64
            }
        })
        .sum();
    total / classes.len() as f64
}

/// Quantile bin (0..bins) of every value; edges use linear interpolation.
pub fn discretize_quantiles(values: &[f64], bins: usize) -> Vec<usize> {
    if values.is_empty() || bins < 2 {
        return vec![0; values.len()];
    }
    let inner: Vec<f64> = (1..bins)
        .filter_map(|b| percentile(values, 100.0 * b as f64 / bins as f64))
        .collect();
    values
        .iter()
        .map(|v| inner.iter().filter(|edge| **edge <= *v).count())
        .collect()
}

/// Macro F1 of a multinomial logistic regression on each stratified fold.
#[instrument(skip(x, labels), fields(rows = x.nrows()))]
pub fn predictive_power<S: AsRef<str>>(
    x: &Array2<f64>,
    labels: &[S],
    folds: usize,
    seed: u64,
) -> Result<Vec<f64>> {
    if labels.len() != x.nrows() {
        return Err(PipelineError::DimensionMismatch {
            expected: x.nrows(),
            found: labels.len(),
        }
        .into());
    }
    let (classes, codes) = encode_labels(labels);
    if classes.len() < 2 {
        return Err(PipelineError::TooFewGroups {
            needed: 2,
            found: classes.len(),
        }
        .into());
    }
    let splits = stratified_folds(&codes, folds, seed);
    let mut scores = Vec::with_capacity(splits.len());
    for (fold, test) in splits.iter().enumerate() {
        if test.is_empty() {
            continue;
        }
        let mut in_test = vec![false; x.nrows()];
        test.iter().for_each(|&i| in_test[i] = true);
        let train: Vec<usize> = (0..x.nrows()).filter(|&i| !in_test[i]).collect();

        let x_train = x.select(Axis(0), &train);
        let y_train: Array1<usize> = train.iter().map(|&i| codes[i]).collect();
        let dataset = DatasetBase::new(x_train, y_train);
        let model = MultiLogisticRegression::default()
            .max_iterations(MAX_ITERATIONS)
            .fit(&dataset)?;

        let x_test = x.select(Axis(0), test);
        let predicted: Array1<usize> = model.predict(&x_test);
        let truth: Vec<usize> = test.iter().map(|&i| codes[i]).collect();
        let predicted: Vec<usize> = predicted.iter().copied().collect();
        let score = macro_f1(&truth, &predicted);
        debug!(fold, score, "fold scored");
        scores.push(score);
    }
    let mean = scores.iter().sum::<f64>() / scores.len().max(1) as f64;
    let std = (scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>()
        / scores.len().max(1) as f64)
        .sqrt();
    info!(classes = classes.len(), mean, std, "macro F1 across folds");
    Ok(scores)
}

/// Predictive power of a continuous target after quantile binning.
pub fn predictive_power_continuous(
    x: &Array2<f64>,
    values: &[f64],
    folds: usize,
    seed: u64,
) -> Result<Vec<f64>> {
    let bins: Vec<String> = discretize_quantiles(values, DEFAULT_BINS)
        .into_iter()
        .map(|b| b.to_string())
        .collect();
    predictive_power(x, &bins, folds, seed)
}
