//! CLI entry-point for embedding generation.

use anyhow::Result;
use tracing::instrument;

use crate::{config::Settings, nlp};

#[instrument(skip(settings))]
pub fn run(settings: Settings) -> Result<()> {
    nlp::embeddings::embed_speeches(&settings)
}
