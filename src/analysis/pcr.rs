//! Principal component regression: which pair of principal components best
//! separates the categories on its own.

use anyhow::Result;
use linfa::{
    dataset::DatasetBase,
    prelude::{Fit, Predict},
};
use linfa_logistic::MultiLogisticRegression;
use linfa_reduction::Pca;
use ndarray::{Array1, Array2, Axis};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::{analysis::encode_labels, error::PipelineError};

pub const DEFAULT_COMPONENTS: usize = 100;
const MAX_ITERATIONS: u64 = 100;

/// Training accuracy of a logistic regression on two principal components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentPair {
    pub first: usize,
    pub second: usize,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentRegression {
    pub classes: Vec<String>,
    pub n_components: usize,
    /// Share of the total variance kept by the fitted components.
    pub explained_variance: f64,
    pub best: ComponentPair,
    /// Every pair `first < second`, in row-major order.
    pub pairs: Vec<ComponentPair>,
}

fn accuracy(truth: &[usize], predicted: &Array1<usize>) -> f64 {
    let hits = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    hits as f64 / truth.len().max(1) as f64
}

/// Reduce `x` to `n_components` principal components and score a logistic
/// regression on every pair of them. The best pair wins on the first
/// maximum in row-major order.
#[instrument(skip(x, labels), fields(rows = x.nrows(), dim = x.ncols()))]
pub fn principal_component_regression<S: AsRef<str>>(
    x: &Array2<f64>,
    labels: &[S],
    n_components: usize,
) -> Result<ComponentRegression> {
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
    let usable = n_components.min(x.ncols()).min(x.nrows());
    if usable < 2 {
        return Err(PipelineError::EmptyInput("need at least two principal components").into());
    }
    if usable < n_components {
        warn!(requested = n_components, usable, "fewer principal components available");
    }

    let pca = Pca::<f64>::params(usable).fit(&DatasetBase::from(x.clone()))?;
    let explained_variance = pca.explained_variance_ratio().sum();
    let scores: Array2<f64> = pca.predict(x);
    debug!(explained_variance, "fitted PCA");

    let targets: Array1<usize> = codes.iter().copied().collect();
    let mut pairs = Vec::with_capacity(usable * (usable - 1) / 2);
    for first in 0..usable {
        for second in first + 1..usable {
            let records = scores.select(Axis(1), &[first, second]);
            let dataset = DatasetBase::new(records.clone(), targets.clone());
            let model = MultiLogisticRegression::default()
                .max_iterations(MAX_ITERATIONS)
                .fit(&dataset)?;
            let predicted: Array1<usize> = model.predict(&records);
            pairs.push(ComponentPair {
                first,
                second,
                accuracy: accuracy(&codes, &predicted),
            });
        }
    }

    let best = pairs
        .iter()
        .copied()
        .reduce(|best, pair| if pair.accuracy > best.accuracy { pair } else { best })
        .ok_or(PipelineError::EmptyInput("no component pairs"))?;
    info!(
        first = best.first,
        second = best.second,
        accuracy = best.accuracy,
        classes = classes.len(),
        "best separating component pair"
    );
    Ok(ComponentRegression {
        classes,
        n_components: usable,
        explained_variance,
        best,
        pairs,
    })
}
