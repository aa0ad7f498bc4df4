//! CLI entry-point for vocabulary extraction.

use anyhow::Result;
use tracing::{info, instrument};

use crate::{cli::write_report, config::Settings, data::speeches, nlp::vocab::vocabulary};

#[instrument(skip(settings))]
pub fn run(settings: Settings) -> Result<()> {
    let table = speeches::read_parquet(&settings.migration_speeches())?;
    let words = vocabulary(&table);
    info!(words = words.len(), "extracted vocabulary");
    write_report(&settings, "vocabulary.json", &words)?;
    Ok(())
}
