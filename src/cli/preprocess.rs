//! CLI entry-point for the cleaning pipeline.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{
    config::Settings,
    data::speeches,
    error::PipelineError,
    pipeline::{Pipeline, PipelineConfig},
    topics::{self, TopicSource},
};

#[derive(Debug, ClapArgs)]
pub struct Args {
    /// Input table; defaults to the translated speeches under DATA_DIR.
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Skip topic assignment even if a trained model exists.
    #[arg(long)]
    pub no_topics: bool,
}

#[instrument(skip(settings))]
pub fn run(args: Args, settings: Settings) -> Result<()> {
    let input = args.input.unwrap_or_else(|| settings.translated_speeches());
    let table = speeches::read_parquet(&input)?;

    let source = if args.no_topics {
        TopicSource::Pending
    } else {
        TopicSource::from_paths(&settings.topic_model(), &settings.topic_corpus())?
    };
    if let TopicSource::Ready { model, .. } = &source {
        if model.num_topics() != settings.n_topics {
            return Err(PipelineError::InvalidModel(format!(
                "model has {} topics, N_TOPICS is {}",
                model.num_topics(),
                settings.n_topics
            ))
            .into());
        }
    }

    let pipeline = Pipeline::standard(&PipelineConfig::from(&settings), source);
    info!(steps = ?pipeline.names(), "running preprocessing");
    let cleaned = pipeline.run(table)?;
    speeches::write_parquet(&cleaned, &settings.all_speeches())?;

    if cleaned.iter().all(|r| r.topics.is_some()) && !cleaned.is_empty() {
        let subset = topics::migration_subset(
            &cleaned,
            settings.migration_topic_id,
            settings.migration_threshold,
        )?;
        speeches::write_parquet(&subset, &settings.migration_speeches())?;
    }
    Ok(())
}
