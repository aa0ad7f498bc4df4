//! Reading meaning off projection axes through a reference vocabulary.

use ndarray::Array2;
use serde::Serialize;

use crate::{analysis::pls::Pls, data::embedded::VocabTable, error::PipelineError};

/// Words at both ends of one projection axis with their scores.
#[derive(Debug, Clone, Serialize)]
pub struct AxisPoles {
    pub axis: usize,
    /// Lowest scores first.
    pub negative: Vec<(String, f64)>,
    /// Highest scores first.
    pub positive: Vec<(String, f64)>,
}

/// Project the vocabulary and keep the `top_n` words at each pole of `axis`.
pub fn axis_poles(
    pls: &Pls,
    vocab: &VocabTable,
    axis: usize,
    top_n: usize,
) -> Result<AxisPoles, PipelineError> {
    if axis >= pls.n_components() {
        return Err(PipelineError::DimensionMismatch {
            expected: pls.n_components(),
            found: axis + 1,
        });
    }
    if vocab.words.len() != vocab.matrix.nrows() {
        return Err(PipelineError::DimensionMismatch {
            expected: vocab.words.len(),
            found: vocab.matrix.nrows(),
        });
    }
    let reduced = pls.transform(&vocab.matrix)?;
    let scores = reduced.column(axis);
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let pick = |idx: &usize| (vocab.words[*idx].clone(), scores[*idx]);
    let negative = order.iter().take(top_n).map(pick).collect();
    let positive = order.iter().rev().take(top_n).map(pick).collect();
    Ok(AxisPoles {
        axis,
        negative,
        positive,
    })
}

/// Rows with the minimum and maximum score on the first two axes,
/// in the order min₀, max₀, min₁, max₁.
pub fn extreme_examples(scores: &Array2<f64>) -> Option<[usize; 4]> {
    if scores.nrows() == 0 || scores.ncols() < 2 {
        return None;
    }
    let arg = |axis: usize, max: bool| {
        let col = scores.column(axis);
        let it = (0..col.len()).map(|i| (i, col[i]));
        let best = if max {
            it.max_by(|a, b| a.1.total_cmp(&b.1))
        } else {
            it.min_by(|a, b| a.1.total_cmp(&b.1))
        };
        best.map(|(i, _)| i).unwrap_or_default()
    };
    Some([arg(0, false), arg(0, true), arg(1, false), arg(1, true)])
}
