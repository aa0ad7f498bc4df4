//! CLI entry-point for group cohesion and separability metrics.

use anyhow::Result;
use clap::Args as ClapArgs;
use serde::Serialize;
use tracing::instrument;

use crate::{
    analysis::{
        clustering::{cluster_quality, ClusterQuality},
        predictive::{predictive_power, DEFAULT_FOLDS},
        similarity::{cohesiveness_from, group_similarities, GroupSimilarity},
    },
    cli::{write_report, GroupBy},
    config::Settings,
    data::embedded::{read_embedding_table, WEIGHT_COLUMN},
    error::PipelineError,
};

#[derive(Debug, ClapArgs)]
pub struct Args {
    #[arg(long, value_enum, default_value_t = GroupBy::Party)]
    pub by: GroupBy,
    /// Weight similarities and clustering by migration-topic probability.
    #[arg(long)]
    pub weighted: bool,
    #[arg(long, default_value_t = DEFAULT_FOLDS)]
    pub folds: usize,
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
    /// Skip the cross-validated classifier.
    #[arg(long)]
    pub skip_predictive: bool,
}

#[derive(Debug, Serialize)]
struct CohesionReport {
    group_by: &'static str,
    weighted: bool,
    cohesiveness: f64,
    groups: Vec<GroupSimilarity>,
    macro_f1: Option<Vec<f64>>,
    clustering: ClusterQuality,
}

#[instrument(skip(settings))]
pub fn run(args: Args, settings: Settings) -> Result<()> {
    let column = args.by.column();
    let table = read_embedding_table(
        &settings.migration_embedded(),
        &settings.embedding_model,
        column,
    )?;
    let weights = if args.weighted {
        Some(
            table
                .weights
                .as_deref()
                .ok_or_else(|| PipelineError::MissingColumn(WEIGHT_COLUMN.to_string()))?,
        )
    } else {
        None
    };

    let groups = group_similarities(&table.matrix, &table.labels, weights)?;
    let cohesiveness = cohesiveness_from(&groups)?;
    let macro_f1 = if args.skip_predictive {
        None
    } else {
        Some(predictive_power(
            &table.matrix,
            &table.labels,
            args.folds,
            args.seed,
        )?)
    };
    let clustering = cluster_quality(&table.matrix, &table.labels, weights)?;

    let suffix = if args.weighted { "_weighted" } else { "" };
    write_report(
        &settings,
        &format!("cohesion_{column}{suffix}.json"),
        &CohesionReport {
            group_by: column,
            weighted: args.weighted,
            cohesiveness,
            groups,
            macro_f1,
            clustering,
        },
    )?;
    Ok(())
}
