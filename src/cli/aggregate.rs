//! CLI entry-point for per-year aggregate embeddings.

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{
    analysis::aggregate::aggregate_by_year,
    cli::GroupBy,
    config::Settings,
    data::embedded::{read_embedding_table, write_aggregates},
};

#[derive(Debug, ClapArgs)]
pub struct Args {
    /// Category to aggregate on.
    #[arg(long, value_enum, default_value_t = GroupBy::Party)]
    pub by: GroupBy,
    /// Weight every speech by its migration-topic probability.
    #[arg(long)]
    pub weighted: bool,
}

#[instrument(skip(settings))]
pub fn run(args: Args, settings: Settings) -> Result<()> {
    let column = args.by.column();
    let table = read_embedding_table(
        &settings.migration_embedded(),
        &settings.embedding_model,
        column,
    )?;
    let groups = aggregate_by_year(&table, args.weighted)?;

    let categories: Vec<String> = groups.iter().map(|g| g.category.clone()).collect();
    let years: Vec<i32> = groups.iter().map(|g| g.year).collect();
    let embeddings: Vec<Vec<f32>> = groups
        .iter()
        .map(|g| g.embedding.iter().map(|&v| v as f32).collect())
        .collect();
    let suffix = if args.weighted { "_weighted" } else { "" };
    write_aggregates(
        column,
        &categories,
        &years,
        &embeddings,
        &settings.embedding_model,
        &settings.join_output(format!("aggregated_{column}{suffix}.parquet")),
    )
}
