//! Speech records and their parquet representation.

use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use polars::prelude::{
    DataFrame, DataType, NamedFrom, ParquetReader, ParquetWriter, SerReader, Series,
};
use tracing::info;

use crate::{data::parties::Block, error::PipelineError, topics::TopicDistribution};

/// One parliamentary utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRecord {
    pub text: String,
    pub translated_text: String,
    pub party: String,
    pub date: String,
    pub period: i64,
    pub agenda: String,
    pub speech_number: i64,
    pub written: bool,
    pub year: Option<i32>,
    pub block: Option<Block>,
    pub topics: Option<TopicDistribution>,
    pub migration_prob: Option<f32>,
}

impl SpeechRecord {
    /// Bare record as it arrives from the translation stage.
    pub fn new(
        text: impl Into<String>,
        translated_text: impl Into<String>,
        party: impl Into<String>,
        date: impl Into<String>,
        period: i64,
    ) -> Self {
        Self {
            text: text.into(),
            translated_text: translated_text.into(),
            party: party.into(),
            date: date.into(),
            period,
            agenda: String::new(),
            speech_number: 0,
            written: false,
            year: None,
            block: None,
            topics: None,
            migration_prob: None,
        }
    }
}

/// Ordered collection of speeches passed between pipeline steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeechTable {
    records: Vec<SpeechRecord>,
}

impl SpeechTable {
    pub fn new(records: Vec<SpeechRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SpeechRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<SpeechRecord> {
        self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpeechRecord> {
        self.records.iter()
    }

    /// Keep the records matching `keep`, preserving order.
    pub fn retain<F>(self, keep: F) -> Self
    where
        F: FnMut(&SpeechRecord) -> bool,
    {
        let mut records = self.records;
        records.retain(keep);
        Self { records }
    }

    /// Apply a fallible per-record rewrite.
    pub fn try_map<F>(self, f: F) -> Result<Self, PipelineError>
    where
        F: FnMut(SpeechRecord) -> Result<SpeechRecord, PipelineError>,
    {
        let records = self
            .records
            .into_iter()
            .map(f)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { records })
    }
}

impl FromIterator<SpeechRecord> for SpeechTable {
    fn from_iter<I: IntoIterator<Item = SpeechRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map_err(|_| PipelineError::MissingColumn(name.to_string()).into())
}

/// Read a speech table from parquet.
pub fn read_parquet(path: &Path) -> Result<SpeechTable> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let df = ParquetReader::new(file).finish()?;
    let table = from_frame(&df)?;
    info!(path = %path.display(), rows = table.len(), "loaded speeches");
    Ok(table)
}

/// Convert a polars frame into speech records.
///
/// `year`, `block`, `topic_{i}` and `migration_prob` are picked up when
/// present so that pipeline outputs can be read back.
pub fn from_frame(df: &DataFrame) -> Result<SpeechTable> {
    let text = column(df, "text")?.str()?;
    let translated = column(df, "translatedText")?.str()?;
    let party = column(df, "party")?.str()?;
    let date = column(df, "date")?.str()?;
    let period = column(df, "period")?.cast(&DataType::Int64)?;
    let period = period.i64()?;
    let agenda = column(df, "agenda")?.cast(&DataType::String)?;
    let agenda = agenda.str()?;
    let speech_number = column(df, "speechnumber")?.cast(&DataType::Int64)?;
    let speech_number = speech_number.i64()?;
    let written = column(df, "written")?.cast(&DataType::Boolean)?;
    let written = written.bool()?;

    let year = match df.column("year") {
        Ok(series) => Some(series.cast(&DataType::Int32)?),
        Err(_) => None,
    };
    let block = match df.column("block") {
        Ok(series) => Some(series.str()?.clone()),
        Err(_) => None,
    };
    let migration = match df.column("migration_prob") {
        Ok(series) => Some(series.cast(&DataType::Float32)?),
        Err(_) => None,
    };
    let mut topic_columns = Vec::new();
    while let Ok(series) = df.column(&format!("topic_{}", topic_columns.len())) {
        topic_columns.push(series.cast(&DataType::Float32)?);
    }

    let year = year.as_ref().map(|s| s.i32()).transpose()?;
    let migration = migration.as_ref().map(|s| s.f32()).transpose()?;
    let topic_columns = topic_columns
        .iter()
        .map(|s| s.f32())
        .collect::<Result<Vec<_>, _>>()?;

    let mut records = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let block = match &block {
            Some(col) => col.get(idx).map(Block::from_label).transpose()?,
            None => None,
        };
        let topics = if topic_columns.is_empty() {
            None
        } else {
            let probs = topic_columns
                .iter()
                .map(|col| col.get(idx).unwrap_or(0.0))
                .collect();
            Some(TopicDistribution::new(probs))
        };
        records.push(SpeechRecord {
            text: text.get(idx).unwrap_or_default().to_string(),
            translated_text: translated.get(idx).unwrap_or_default().to_string(),
            party: party.get(idx).unwrap_or_default().to_string(),
            date: date.get(idx).unwrap_or_default().to_string(),
            period: period.get(idx).unwrap_or_default(),
            agenda: agenda.get(idx).unwrap_or_default().to_string(),
            speech_number: speech_number.get(idx).unwrap_or_default(),
            written: written.get(idx).unwrap_or(false),
            year: year.and_then(|col| col.get(idx)),
            block,
            topics,
            migration_prob: migration.and_then(|col| col.get(idx)),
        });
    }
    Ok(SpeechTable::new(records))
}

/// Convert speech records back into a polars frame.
pub fn to_frame(table: &SpeechTable) -> Result<DataFrame> {
    let records = table.records();
    let mut columns = vec![
        Series::new(
            "text".into(),
            records.iter().map(|r| r.text.as_str()).collect::<Vec<_>>(),
        ),
        Series::new(
            "translatedText".into(),
            records
                .iter()
                .map(|r| r.translated_text.as_str())
                .collect::<Vec<_>>(),
        ),
        Series::new(
            "party".into(),
            records.iter().map(|r| r.party.as_str()).collect::<Vec<_>>(),
        ),
        Series::new(
            "date".into(),
            records.iter().map(|r| r.date.as_str()).collect::<Vec<_>>(),
        ),
        Series::new(
            "period".into(),
            records.iter().map(|r| r.period).collect::<Vec<_>>(),
        ),
        Series::new(
            "agenda".into(),
            records.iter().map(|r| r.agenda.as_str()).collect::<Vec<_>>(),
        ),
        Series::new(
            "speechnumber".into(),
            records.iter().map(|r| r.speech_number).collect::<Vec<_>>(),
        ),
        Series::new(
            "written".into(),
            records.iter().map(|r| r.written).collect::<Vec<_>>(),
        ),
    ];

    if records.iter().any(|r| r.year.is_some()) {
        columns.push(Series::new(
            "year".into(),
            records.iter().map(|r| r.year).collect::<Vec<_>>(),
        ));
    }
    if records.iter().any(|r| r.block.is_some()) {
        columns.push(Series::new(
            "block".into(),
            records
                .iter()
                .map(|r| r.block.map(Block::label))
                .collect::<Vec<_>>(),
        ));
    }
    if let Some(n_topics) = topic_width(records)? {
        for topic in 0..n_topics {
            let values: Vec<f32> = records
                .iter()
                .map(|r| r.topics.as_ref().map(|t| t.prob(topic)).unwrap_or(0.0))
                .collect();
            columns.push(Series::new(format!("topic_{topic}").into(), values));
        }
    }
    if records.iter().any(|r| r.migration_prob.is_some()) {
        columns.push(Series::new(
            "migration_prob".into(),
            records.iter().map(|r| r.migration_prob).collect::<Vec<_>>(),
        ));
    }
    Ok(DataFrame::new(columns)?)
}

fn topic_width(records: &[SpeechRecord]) -> Result<Option<usize>> {
    let mut width = None;
    for dist in records.iter().filter_map(|r| r.topics.as_ref()) {
        match width {
            None => width = Some(dist.len()),
            Some(expected) if expected != dist.len() => {
                return Err(PipelineError::DimensionMismatch {
                    expected,
                    found: dist.len(),
                }
                .into())
            }
            Some(_) => {}
        }
    }
    Ok(width)
}

/// Persist a speech table as parquet, creating parent folders.
pub fn write_parquet(table: &SpeechTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut df = to_frame(table)?;
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    ParquetWriter::new(file).finish(&mut df)?;
    info!(path = %path.display(), rows = table.len(), columns = df.width(), "wrote speeches parquet");
    Ok(())
}
