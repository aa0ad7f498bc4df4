//! Intra- and inter-group cosine similarity and group cohesiveness.

use indexmap::IndexMap;
use ndarray::{Array2, Axis};
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::PipelineError;

/// Similarity summary of one group.
#[derive(Debug, Clone, Serialize)]
pub struct GroupSimilarity {
    pub group: String,
    pub size: usize,
    /// Mean pairwise similarity among members, diagonal included.
    pub intra: f64,
    /// Mean similarity between members and non-members.
    pub inter: f64,
}

/// Rows scaled to unit length; zero rows stay zero.
pub fn l2_normalize(x: &Array2<f64>) -> Array2<f64> {
    let mut out = x.clone();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row /= norm;
        }
    }
    out
}

/// Pairwise cosine similarity of the rows of `x`.
pub fn cosine_matrix(x: &Array2<f64>) -> Array2<f64> {
    let unit = l2_normalize(x);
    unit.dot(&unit.t())
}

/// Per-group intra and inter similarity. With `weights`, every pair is scaled
/// by the product of both rows' weights after the weight vector is scaled to
/// unit length.
#[instrument(skip_all, fields(rows = x.nrows()))]
pub fn group_similarities<S: AsRef<str>>(
    x: &Array2<f64>,
    labels: &[S],
    weights: Option<&[f64]>,
) -> Result<Vec<GroupSimilarity>, PipelineError> {
    if labels.len() != x.nrows() {
        return Err(PipelineError::DimensionMismatch {
            expected: x.nrows(),
            found: labels.len(),
        });
    }
    let mut unit = l2_normalize(x);
    if let Some(weights) = weights {
        if weights.len() != x.nrows() {
            return Err(PipelineError::DimensionMismatch {
                expected: x.nrows(),
                found: weights.len(),
            });
        }
        let norm = weights.iter().map(|w| w * w).sum::<f64>().sqrt();
        if norm == 0.0 {
            return Err(PipelineError::ZeroWeight("relevance vector".into()));
        }
        for (mut row, w) in unit.axis_iter_mut(Axis(0)).zip(weights) {
            row *= *w / norm;
        }
    }
    let sim = unit.dot(&unit.t());

    let mut groups: IndexMap<&str, Vec<usize>> = IndexMap::new();
    for (idx, label) in labels.iter().enumerate() {
        groups.entry(label.as_ref()).or_default().push(idx);
    }
    if groups.len() < 2 {
        return Err(PipelineError::TooFewGroups {
            needed: 2,
            found: groups.len(),
        });
    }

    let n = x.nrows();
    let mut member = vec![false; n];
    let mut out = Vec::with_capacity(groups.len());
    for (group, rows) in &groups {
        member.iter_mut().for_each(|m| *m = false);
        rows.iter().for_each(|&r| member[r] = true);
        let mut intra = 0.0;
        let mut inter = 0.0;
        for &i in rows {
            for j in 0..n {
                if member[j] {
                    intra += sim[[i, j]];
                } else {
                    inter += sim[[i, j]];
                }
            }
        }
        let size = rows.len();
        out.push(GroupSimilarity {
            group: (*group).to_string(),
            size,
            intra: intra / (size * size) as f64,
            inter: inter / (size * (n - size)) as f64,
        });
    }
    Ok(out)
}

/// Size-weighted mean of `intra / inter - 1` across groups.
pub fn cohesiveness_from(groups: &[GroupSimilarity]) -> Result<f64, PipelineError> {
    let total: usize = groups.iter().map(|g| g.size).sum();
    if total == 0 {
        return Err(PipelineError::EmptyInput("no groups to score"));
    }
    let mut acc = 0.0;
    for g in groups {
        if g.inter == 0.0 {
            return Err(PipelineError::ZeroWeight(format!(
                "inter-group similarity of {}",
                g.group
            )));
        }
        acc += (g.intra / g.inter - 1.0) * g.size as f64;
    }
    Ok(acc / total as f64)
}

/// Group cohesiveness of `x` under `labels`.
pub fn cohesiveness<S: AsRef<str>>(
    x: &Array2<f64>,
    labels: &[S],
    weights: Option<&[f64]>,
) -> Result<f64, PipelineError> {
    let groups = group_similarities(x, labels, weights)?;
    let score = cohesiveness_from(&groups)?;
    info!(groups = groups.len(), score, "computed cohesiveness");
    Ok(score)
}
