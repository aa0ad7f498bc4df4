//! CLI entry-point for selecting and inspecting the migration topic.

use anyhow::Result;
use clap::Args as ClapArgs;
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    cli::write_report,
    config::Settings,
    data::speeches,
    topics::{self, LdaModel},
};

#[derive(Debug, ClapArgs)]
pub struct Args {
    /// Topic id; defaults to MIGRATION_TOPIC_ID.
    #[arg(long)]
    pub topic: Option<usize>,
    /// Probability cut-off; defaults to MIGRATION_THRESHOLD.
    #[arg(long)]
    pub threshold: Option<f32>,
    /// Number of top words and speeches to report.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

#[derive(Debug, Serialize)]
struct TopicReport {
    topic: usize,
    threshold: f32,
    selected: usize,
    total: usize,
    top_words: Vec<(String, f64)>,
    top_speeches: Vec<String>,
}

#[instrument(skip(settings))]
pub fn run(args: Args, settings: Settings) -> Result<()> {
    let topic = args.topic.unwrap_or(settings.migration_topic_id);
    let threshold = args.threshold.unwrap_or(settings.migration_threshold);
    let table = speeches::read_parquet(&settings.all_speeches())?;

    let subset = topics::migration_subset(&table, topic, threshold)?;
    speeches::write_parquet(&subset, &settings.migration_speeches())?;

    let model_path = settings.topic_model();
    let top_words = if model_path.exists() {
        LdaModel::load(&model_path)?.top_words(topic, args.top)
    } else {
        Vec::new()
    };
    let top_speeches = topics::top_speeches(&table, topic, args.top)
        .into_iter()
        .filter_map(|idx| table.records().get(idx))
        .map(|r| r.translated_text.clone())
        .collect();
    info!(selected = subset.len(), total = table.len(), "selected topic speeches");

    write_report(
        &settings,
        &format!("topic_{topic}.json"),
        &TopicReport {
            topic,
            threshold,
            selected: subset.len(),
            total: table.len(),
            top_words,
            top_speeches,
        },
    )?;
    Ok(())
}
