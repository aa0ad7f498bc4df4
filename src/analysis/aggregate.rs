//! Per-category, per-year aggregate embeddings.

use indexmap::IndexMap;
use ndarray::Array1;
use tracing::{info, instrument};

use crate::{
    data::{
        embedded::{EmbeddingTable, WEIGHT_COLUMN},
        parties::derive_year,
    },
    error::PipelineError,
};

/// Mean embedding of one (category, year) group.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedEmbedding {
    pub category: String,
    pub year: i32,
    pub members: usize,
    pub embedding: Array1<f64>,
}

/// Group rows by (category, year) and average their embeddings.
///
/// With `weighted`, each member counts in proportion to its relevance
/// probability, normalised to sum to one within the group. Groups come back
/// in order of first appearance.
#[instrument(skip(table), fields(rows = table.len()))]
pub fn aggregate_by_year(
    table: &EmbeddingTable,
    weighted: bool,
) -> Result<Vec<AggregatedEmbedding>, PipelineError> {
    let rows = table.matrix.nrows();
    for found in [table.len(), table.dates.len()] {
        if found != rows {
            return Err(PipelineError::RowCountMismatch { rows, found });
        }
    }
    let weights = if weighted {
        let weights = table
            .weights
            .as_deref()
            .ok_or_else(|| PipelineError::MissingColumn(WEIGHT_COLUMN.to_string()))?;
        if weights.len() != rows {
            return Err(PipelineError::RowCountMismatch {
                rows,
                found: weights.len(),
            });
        }
        Some(weights)
    } else {
        None
    };

    let mut groups: IndexMap<(String, i32), Vec<usize>> = IndexMap::new();
    for (idx, (label, date)) in table.labels.iter().zip(&table.dates).enumerate() {
        let year = derive_year(date)?;
        groups.entry((label.clone(), year)).or_default().push(idx);
    }

    let dim = table.matrix.ncols();
    let mut out = Vec::with_capacity(groups.len());
    for ((category, year), members) in groups {
        let mut embedding = Array1::<f64>::zeros(dim);
        match weights {
            Some(weights) => {
                let total: f64 = members.iter().map(|&i| weights[i]).sum();
                if total == 0.0 {
                    return Err(PipelineError::ZeroWeight(format!("group {category}/{year}")));
                }
                for &i in &members {
                    embedding.scaled_add(weights[i] / total, &table.matrix.row(i));
                }
            }
            None => {
                for &i in &members {
                    embedding += &table.matrix.row(i);
                }
                embedding /= members.len() as f64;
            }
        }
        out.push(AggregatedEmbedding {
            category,
            year,
            members: members.len(),
            embedding,
        });
    }
    info!(groups = out.len(), weighted, "aggregated embeddings");
    Ok(out)
}
