//! Parquet tables carrying dense embedding columns.

use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use ndarray::Array2;
use polars::prelude::{
    DataFrame, DataType, NamedFrom, ParquetReader, ParquetWriter, SerReader, Series,
};
use tracing::info;

use crate::{
    data::speeches::{self, SpeechTable},
    error::PipelineError,
};

/// Relevance column used to weight speeches.
pub const WEIGHT_COLUMN: &str = "migration_prob";

/// Embedded speeches reduced to what the analysis layer needs.
#[derive(Debug, Clone)]
pub struct EmbeddingTable {
    /// Category of every row (party, block, ...).
    pub labels: Vec<String>,
    /// ISO-prefixed speech dates.
    pub dates: Vec<String>,
    /// Optional relevance probability of every row.
    pub weights: Option<Vec<f64>>,
    /// One embedding per row.
    pub matrix: Array2<f64>,
}

impl EmbeddingTable {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Reference vocabulary with one embedding per word.
#[derive(Debug, Clone)]
pub struct VocabTable {
    pub words: Vec<String>,
    pub matrix: Array2<f64>,
}

fn read_frame(path: &Path) -> Result<DataFrame> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(ParquetReader::new(file).finish()?)
}

fn write_frame(mut df: DataFrame, path: &Path, what: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    ParquetWriter::new(file).finish(&mut df)?;
    info!(path = %path.display(), rows = df.height(), what, "wrote parquet");
    Ok(())
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let series = df
        .column(name)
        .map_err(|_| PipelineError::MissingColumn(name.to_string()))?
        .cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

/// Stack a list-of-floats column into a matrix.
pub fn embedding_matrix(df: &DataFrame, column: &str) -> Result<Array2<f64>> {
    let lists = df
        .column(column)
        .map_err(|_| PipelineError::MissingColumn(column.to_string()))?
        .list()?;
    let mut dim = None;
    let mut flat = Vec::new();
    for entry in lists.into_iter() {
        let values: Vec<f64> = match entry {
            Some(series) => series
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect(),
            None => Vec::new(),
        };
        match dim {
            None => dim = Some(values.len()),
            Some(expected) if expected != values.len() => {
                return Err(PipelineError::DimensionMismatch {
                    expected,
                    found: values.len(),
                }
                .into())
            }
            Some(_) => {}
        }
        flat.extend(values);
    }
    let dim = dim.unwrap_or(0);
    Ok(Array2::from_shape_vec((df.height(), dim), flat)?)
}

/// Load embedded speeches grouped by `label_column`.
pub fn read_embedding_table(
    path: &Path,
    embedding_column: &str,
    label_column: &str,
) -> Result<EmbeddingTable> {
    let df = read_frame(path)?;
    let labels = string_column(&df, label_column)?;
    let dates = string_column(&df, "date")?;
    let weights: Option<Vec<f64>> = match df.column(WEIGHT_COLUMN) {
        Ok(series) => Some(
            series
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect(),
        ),
        Err(_) => None,
    };
    let matrix = embedding_matrix(&df, embedding_column)?;
    info!(
        path = %path.display(),
        rows = labels.len(),
        dim = matrix.ncols(),
        "loaded embedding table"
    );
    Ok(EmbeddingTable {
        labels,
        dates,
        weights,
        matrix,
    })
}

/// Load the vocabulary embedding table.
pub fn read_vocab_table(path: &Path, embedding_column: &str) -> Result<VocabTable> {
    let df = read_frame(path)?;
    let words = string_column(&df, "word")?;
    let matrix = embedding_matrix(&df, embedding_column)?;
    Ok(VocabTable { words, matrix })
}

fn list_series(name: &str, rows: &[Vec<f32>]) -> Series {
    let lists: Vec<Series> = rows
        .iter()
        .map(|row| Series::new("".into(), row.as_slice()))
        .collect();
    Series::new(name.into(), lists)
}

fn check_rows(expected: usize, found: usize) -> Result<(), PipelineError> {
    if expected == found {
        Ok(())
    } else {
        Err(PipelineError::DimensionMismatch { expected, found })
    }
}

/// Write speeches with an embedding column named after the model.
pub fn write_embedded_speeches(
    table: &SpeechTable,
    embeddings: &[Vec<f32>],
    column: &str,
    path: &Path,
) -> Result<()> {
    check_rows(table.len(), embeddings.len())?;
    let mut df = speeches::to_frame(table)?;
    df.with_column(list_series(column, embeddings))?;
    write_frame(df, path, "embedded speeches")
}

/// Write the vocabulary embedding table.
pub fn write_vocab_table(
    words: &[String],
    embeddings: &[Vec<f32>],
    column: &str,
    path: &Path,
) -> Result<()> {
    check_rows(words.len(), embeddings.len())?;
    let df = DataFrame::new(vec![
        Series::new("word".into(), words),
        list_series(column, embeddings),
    ])?;
    write_frame(df, path, "vocabulary embeddings")
}

/// Write (category, year, embedding) rows.
pub fn write_aggregates(
    category_column: &str,
    categories: &[String],
    years: &[i32],
    embeddings: &[Vec<f32>],
    embedding_column: &str,
    path: &Path,
) -> Result<()> {
    check_rows(categories.len(), years.len())?;
    check_rows(categories.len(), embeddings.len())?;
    let df = DataFrame::new(vec![
        Series::new(category_column.into(), categories),
        Series::new("year".into(), years),
        list_series(embedding_column, embeddings),
    ])?;
    write_frame(df, path, "aggregated embeddings")
}
