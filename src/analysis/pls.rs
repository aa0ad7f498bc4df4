//! Partial least squares projection of embeddings onto label-aligned axes.
//!
//! Inputs and targets are standardised with the sample (n - 1) standard
//! deviation before the NIPALS components are extracted.

use std::fmt;

use linfa::{
    traits::{Fit, Predict, Transformer},
    DatasetBase,
};
use linfa_pls::PlsRegression;
use ndarray::{Array1, Array2, Axis};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::{debug, info, instrument};

use crate::{analysis::encode_labels, error::PipelineError};

const MAX_ITER: usize = 500;
const TOL: f64 = 1e-6;

/// Fitted PLS2 regression.
pub struct Pls {
    model: PlsRegression<f64>,
    n_targets: usize,
}

impl fmt::Debug for Pls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pls")
            .field("n_features", &self.n_features())
            .field("n_components", &self.n_components())
            .field("n_targets", &self.n_targets)
            .finish()
    }
}

/// Projection trained on one-hot category labels, with its hold-out score.
#[derive(Debug)]
pub struct PlsProjection {
    pub pls: Pls,
    pub classes: Vec<String>,
    pub test_r2: f64,
}

impl Pls {
    /// Fit `n_components` PLS components of `y` on `x`.
    pub fn fit(x: &Array2<f64>, y: &Array2<f64>, n_components: usize) -> Result<Self, PipelineError> {
        if x.nrows() != y.nrows() {
            return Err(PipelineError::DimensionMismatch {
                expected: x.nrows(),
                found: y.nrows(),
            });
        }
        if x.nrows() < 2 {
            return Err(PipelineError::EmptyInput("PLS needs at least two samples"));
        }
        if n_components == 0 || n_components > x.ncols() {
            return Err(PipelineError::InvalidModel(format!(
                "{n_components} components for {} features",
                x.ncols()
            )));
        }
        let dataset = DatasetBase::new(x.to_owned(), y.to_owned());
        let model = PlsRegression::<f64>::params(n_components)
            .scale(true)
            .max_iterations(MAX_ITER)
            .tolerance(TOL)
            .fit(&dataset)?;
        debug!(n_components, targets = y.ncols(), "fitted PLS regression");
        Ok(Self {
            model,
            n_targets: y.ncols(),
        })
    }

    pub fn n_components(&self) -> usize {
        self.rotations().ncols()
    }

    pub fn n_features(&self) -> usize {
        self.rotations().nrows()
    }

    /// Feature-space rotations, one column per component.
    pub fn rotations(&self) -> &Array2<f64> {
        self.model.rotations().0
    }

    /// Rotation weight of every feature on `axis`.
    pub fn rotation(&self, axis: usize) -> Option<Array1<f64>> {
        (axis < self.n_components()).then(|| self.rotations().column(axis).to_owned())
    }

    fn check_features(&self, x: &Array2<f64>) -> Result<(), PipelineError> {
        if x.ncols() != self.n_features() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.n_features(),
                found: x.ncols(),
            });
        }
        Ok(())
    }

    /// Component scores of `x`.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, PipelineError> {
        self.check_features(x)?;
        // targets only feed the y-scores, which are discarded
        let dataset = DatasetBase::new(x.to_owned(), Array2::zeros((x.nrows(), self.n_targets)));
        Ok(self.model.transform(dataset).records)
    }

    /// Predicted targets of `x` in original units.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>, PipelineError> {
        self.check_features(x)?;
        let predicted: Array2<f64> = self.model.predict(x);
        Ok(predicted)
    }

    /// Coefficient of determination averaged uniformly over targets.
    pub fn score(&self, x: &Array2<f64>, y: &Array2<f64>) -> Result<f64, PipelineError> {
        let pred = self.predict(x)?;
        Ok(r2_score(y, &pred))
    }
}

/// Uniform-average R². Constant targets score 1 when predicted exactly, else 0.
pub fn r2_score(truth: &Array2<f64>, pred: &Array2<f64>) -> f64 {
    let q = truth.ncols();
    if q == 0 {
        return 0.0;
    }
    let mut total = 0.0;
    for j in 0..q {
        let t = truth.column(j);
        let p = pred.column(j);
        let mean = t.mean().unwrap_or(0.0);
        let ss_res: f64 = t.iter().zip(p.iter()).map(|(a, b)| (a - b).powi(2)).sum();
        let ss_tot: f64 = t.iter().map(|a| (a - mean).powi(2)).sum();
        total += if ss_tot == 0.0 {
            if ss_res == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - ss_res / ss_tot
        };
    }
    total / q as f64
}

/// One-hot encoding of categorical labels over sorted classes.
pub fn one_hot<S: AsRef<str>>(labels: &[S]) -> (Vec<String>, Array2<f64>) {
    let (classes, codes) = encode_labels(labels);
    let mut y = Array2::zeros((labels.len(), classes.len()));
    for (row, code) in codes.into_iter().enumerate() {
        y[[row, code]] = 1.0;
    }
    (classes, y)
}

/// Shuffled train/test row indices. The test share is rounded up.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut idx: Vec<usize> = (0..n).collect();
    idx.shuffle(&mut StdRng::seed_from_u64(seed));
    let n_test = ((n as f64) * test_fraction).ceil() as usize;
    let n_test = n_test.min(n);
    let test = idx[..n_test].to_vec();
    let train = idx[n_test..].to_vec();
    (train, test)
}

fn select_rows(m: &Array2<f64>, rows: &[usize]) -> Array2<f64> {
    m.select(Axis(0), rows)
}

/// Fit on a seeded train split of `x`/`y` and score R² on the held-out rows.
pub fn fit_split_targets(
    x: &Array2<f64>,
    y: &Array2<f64>,
    n_components: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<(Pls, f64), PipelineError> {
    let (train, test) = train_test_split(x.nrows(), test_fraction, seed);
    if test.is_empty() {
        return Err(PipelineError::EmptyInput("hold-out split is empty"));
    }
    let pls = Pls::fit(&select_rows(x, &train), &select_rows(y, &train), n_components)?;
    let r2 = pls.score(&select_rows(x, &test), &select_rows(y, &test))?;
    Ok((pls, r2))
}

/// Fit a projection whose axes separate the given categories.
#[instrument(skip(x, labels), fields(rows = x.nrows(), dim = x.ncols()))]
pub fn fit_split<S: AsRef<str>>(
    x: &Array2<f64>,
    labels: &[S],
    n_components: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<PlsProjection, PipelineError> {
    if labels.len() != x.nrows() {
        return Err(PipelineError::DimensionMismatch {
            expected: x.nrows(),
            found: labels.len(),
        });
    }
    let (classes, y) = one_hot(labels);
    let (pls, test_r2) = fit_split_targets(x, &y, n_components, test_fraction, seed)?;
    info!(classes = classes.len(), test_r2, "fitted PLS projection");
    Ok(PlsProjection {
        pls,
        classes,
        test_r2,
    })
}
