//! Fatal validation errors raised by the preprocessing and analysis layers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("corpus has {corpus} documents but the speech table has {rows} rows; was the table modified after the corpus was built?")]
    CorpusMisaligned { rows: usize, corpus: usize },

    #[error("party codes without a block mapping: {}", .0.join(", "))]
    UnmappedParty(Vec<String>),

    #[error("party codes outside the consolidation table: {}", .0.join(", "))]
    UnknownPartyCode(Vec<String>),

    #[error("unknown block label {0:?}")]
    UnknownBlock(String),

    #[error("cannot derive a year from date {0:?}")]
    InvalidDate(String),

    #[error("expected vectors of dimension {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("embedding matrix has {rows} rows but a companion column has {found} entries")]
    RowCountMismatch { rows: usize, found: usize },

    #[error("zero total weight: {0}")]
    ZeroWeight(String),

    #[error("need at least {needed} groups, found {found}")]
    TooFewGroups { needed: usize, found: usize },

    #[error("insufficient input: {0}")]
    EmptyInput(&'static str),

    #[error("missing column {0:?}")]
    MissingColumn(String),

    #[error("topic id {topic} out of range for a {n_topics}-topic model")]
    TopicOutOfRange { topic: usize, n_topics: usize },

    #[error("PLS fit failed: {0}")]
    Projection(#[from] linfa_pls::PlsError),

    #[error("invalid topic model: {0}")]
    InvalidModel(String),

    #[error("malformed corpus line {line}: {reason}")]
    MalformedCorpus { line: usize, reason: String },
}
