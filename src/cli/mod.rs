//! Command-line interface wiring for parl-discourse.

use std::{fs::File, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

use crate::config::Settings;

pub mod aggregate;
pub mod axes;
pub mod cohesion;
pub mod embed;
pub mod migration;
pub mod preprocess;
pub mod vocab;

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(author, version, about = "Parliamentary speech discourse analysis", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse CLI arguments from the environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Dispatch the selected sub-command.
    pub fn dispatch(self, settings: Settings) -> Result<()> {
        match self.command {
            Commands::Preprocess(args) => preprocess::run(args, settings),
            Commands::Migration(args) => migration::run(args, settings),
            Commands::Embed => embed::run(settings),
            Commands::Vocab => vocab::run(settings),
            Commands::Aggregate(args) => aggregate::run(args, settings),
            Commands::Axes(args) => axes::run(args, settings),
            Commands::Cohesion(args) => cohesion::run(args, settings),
        }
    }
}

/// Supported sub-commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Clean translated speeches and assign topic probabilities.
    Preprocess(preprocess::Args),
    /// Select speeches about the migration topic.
    Migration(migration::Args),
    /// Embed migration speeches and their vocabulary.
    Embed,
    /// List the normalised vocabulary of the migration speeches.
    Vocab,
    /// Average embeddings per category and year.
    Aggregate(aggregate::Args),
    /// Fit the supervised projection and label its axes.
    Axes(axes::Args),
    /// Score group cohesion, predictability and cluster quality.
    Cohesion(cohesion::Args),
}

/// Category speeches are grouped by.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum GroupBy {
    Party,
    Block,
}

impl GroupBy {
    pub fn column(self) -> &'static str {
        match self {
            Self::Party => "party",
            Self::Block => "block",
        }
    }
}

/// Persist a JSON report under the outputs directory.
pub fn write_report<T: Serialize>(settings: &Settings, name: &str, report: &T) -> Result<PathBuf> {
    let path = settings.join_output(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)?;
    info!(path = %path.display(), "wrote report");
    Ok(path)
}
