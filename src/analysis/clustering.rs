//! Unsupervised cluster quality against ground-truth categories.

use std::collections::HashMap;

use anyhow::Result;
use linfa::prelude::*;
use linfa_clustering::KMeans;
use ndarray::{Array1, Array2};
use serde::Serialize;
use tracing::{info, instrument};

use crate::{analysis::encode_labels, error::PipelineError};

const MAX_ITERATIONS: u64 = 300;
const TOLERANCE: f64 = 1e-4;

/// Agreement between k-means clusters and true categories.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClusterQuality {
    pub homogeneity: f64,
    pub completeness: f64,
    pub v_measure: f64,
}

fn entropy(counts: impl Iterator<Item = usize>, n: f64) -> f64 {
    counts
        .filter(|&c| c > 0)
        .map(|c| {
            let p = c as f64 / n;
            -p * p.ln()
        })
        .sum()
}

/// Homogeneity, completeness and V-measure of `predicted` against `truth`.
pub fn cluster_scores(truth: &[usize], predicted: &[usize]) -> ClusterQuality {
    let n = truth.len();
    if n == 0 {
        return ClusterQuality {
            homogeneity: 1.0,
            completeness: 1.0,
            v_measure: 1.0,
        };
    }
    let nf = n as f64;
    let mut joint: HashMap<(usize, usize), usize> = HashMap::new();
    let mut classes: HashMap<usize, usize> = HashMap::new();
    let mut clusters: HashMap<usize, usize> = HashMap::new();
    for (&c, &k) in truth.iter().zip(predicted) {
        *joint.entry((c, k)).or_insert(0) += 1;
        *classes.entry(c).or_insert(0) += 1;
        *clusters.entry(k).or_insert(0) += 1;
    }
    let h_c = entropy(classes.values().copied(), nf);
    let h_k = entropy(clusters.values().copied(), nf);
    let mutual: f64 = joint
        .iter()
        .map(|(&(c, k), &nck)| {
            let nck = nck as f64;
            let (nc, nk) = (classes[&c] as f64, clusters[&k] as f64);
            (nck / nf) * (nck * nf / (nc * nk)).ln()
        })
        .sum();

    let homogeneity = if h_c == 0.0 { 1.0 } else { mutual / h_c };
    let completeness = if h_k == 0.0 { 1.0 } else { mutual / h_k };
    let v_measure = if homogeneity + completeness == 0.0 {
        0.0
    } else {
        2.0 * homogeneity * completeness / (homogeneity + completeness)
    };
    ClusterQuality {
        homogeneity,
        completeness,
        v_measure,
    }
}

/// Run k-means with one cluster per distinct label and score the partition.
#[instrument(skip_all, fields(rows = x.nrows(), weighted = weights.is_some()))]
pub fn cluster_quality<S: AsRef<str>>(
    x: &Array2<f64>,
    labels: &[S],
    weights: Option<&[f64]>,
) -> Result<ClusterQuality> {
    if labels.len() != x.nrows() {
        return Err(PipelineError::DimensionMismatch {
            expected: x.nrows(),
            found: labels.len(),
        }
        .into());
    }
    let (classes, truth) = encode_labels(labels);
    if classes.is_empty() {
        return Err(PipelineError::EmptyInput("no labels to cluster").into());
    }
    let dataset = DatasetBase::from(x.clone());
    let dataset = match weights {
        Some(w) => {
            if w.len() != x.nrows() {
                return Err(PipelineError::DimensionMismatch {
                    expected: x.nrows(),
                    found: w.len(),
                }
                .into());
            }
            dataset.with_weights(w.iter().map(|&v| v as f32).collect::<Array1<f32>>())
        }
        None => dataset,
    };
    let model = KMeans::params(classes.len())
        .max_n_iterations(MAX_ITERATIONS)
        .tolerance(TOLERANCE)
        .fit(&dataset)?;
    let predicted: Array1<usize> = model.predict(x);
    let predicted: Vec<usize> = predicted.iter().copied().collect();
    let quality = cluster_scores(&truth, &predicted);
    info!(
        k = classes.len(),
        homogeneity = quality.homogeneity,
        completeness = quality.completeness,
        v_measure = quality.v_measure,
        "scored k-means clustering"
    );
    Ok(quality)
}
