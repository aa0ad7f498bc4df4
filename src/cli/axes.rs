//! CLI entry-point for the supervised projection and its axis vocabulary.

use anyhow::Result;
use clap::Args as ClapArgs;
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    analysis::{
        axes::{axis_poles, extreme_examples, AxisPoles},
        pcr::{principal_component_regression, ComponentRegression, DEFAULT_COMPONENTS},
        pls::fit_split,
    },
    cli::{write_report, GroupBy},
    config::Settings,
    data::embedded::{read_embedding_table, read_vocab_table},
};

#[derive(Debug, ClapArgs)]
pub struct Args {
    /// Category the projection separates.
    #[arg(long, value_enum, default_value_t = GroupBy::Block)]
    pub by: GroupBy,
    #[arg(long, default_value_t = 2)]
    pub components: usize,
    /// Words reported at each pole.
    #[arg(long, default_value_t = 20)]
    pub top: usize,
    #[arg(long, default_value_t = 0.25)]
    pub test_fraction: f64,
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
    /// Principal components searched for the best separating pair.
    #[arg(long, default_value_t = DEFAULT_COMPONENTS)]
    pub pcs: usize,
    #[arg(long)]
    pub skip_pcr: bool,
}

#[derive(Debug, Serialize)]
struct Extreme {
    position: &'static str,
    label: String,
    date: String,
}

#[derive(Debug, Serialize)]
struct AxesReport {
    group_by: &'static str,
    classes: Vec<String>,
    test_r2: f64,
    axes: Vec<AxisPoles>,
    extremes: Vec<Extreme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    principal_components: Option<ComponentRegression>,
}

#[instrument(skip(settings))]
pub fn run(args: Args, settings: Settings) -> Result<()> {
    let column = args.by.column();
    let table = read_embedding_table(
        &settings.migration_embedded(),
        &settings.embedding_model,
        column,
    )?;
    let projection = fit_split(
        &table.matrix,
        &table.labels,
        args.components,
        args.test_fraction,
        args.seed,
    )?;
    info!(r2 = projection.test_r2, "held-out coefficient of determination");

    let vocab = read_vocab_table(&settings.vocab_embedded(), &settings.embedding_model)?;
    let axes = (0..projection.pls.n_components())
        .map(|axis| axis_poles(&projection.pls, &vocab, axis, args.top))
        .collect::<Result<Vec<_>, _>>()?;

    let scores = projection.pls.transform(&table.matrix)?;
    let extremes: Vec<Extreme> = extreme_examples(&scores)
        .map(|idx| {
            ["axis0_min", "axis0_max", "axis1_min", "axis1_max"]
                .into_iter()
                .zip(idx)
                .map(|(position, row)| Extreme {
                    position,
                    label: table.labels[row].clone(),
                    date: table.dates[row].clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    let principal_components = if args.skip_pcr {
        None
    } else {
        Some(principal_component_regression(
            &table.matrix,
            &table.labels,
            args.pcs,
        )?)
    };

    write_report(
        &settings,
        &format!("axes_{column}.json"),
        &AxesReport {
            group_by: column,
            classes: projection.classes,
            test_r2: projection.test_r2,
            axes,
            extremes,
            principal_components,
        },
    )?;
    Ok(())
}
