//! Runtime configuration utilities for parl-discourse.

use std::{
    env,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context;
use serde::Deserialize;

/// Application configuration resolved from `.env` and defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Root folder for speech tables and model artefacts.
    pub data_dir: PathBuf,
    /// Root folder for analytic outputs.
    pub outputs_dir: PathBuf,
    /// Number of topics in the trained model.
    pub n_topics: usize,
    /// Index of the "Migration / Asylum" topic.
    pub migration_topic_id: usize,
    /// Minimum topic probability for a speech to count as a migration speech.
    pub migration_threshold: f32,
    /// Legislative periods kept by the period filter.
    pub keep_periods: Vec<i64>,
    /// Percentile cut-off for generic opening sentences.
    pub greeting_percentile: f64,
    /// Percentile cut-off for generic closing sentences.
    pub ending_percentile: f64,
    /// Name of the embedding column (and fastembed model when enabled).
    pub embedding_model: String,
}

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));
        let outputs_dir = env::var("OUTPUTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./outputs"));
        let keep_periods = match env::var("KEEP_PERIODS") {
            Ok(raw) => parse_list(&raw).context("parsing KEEP_PERIODS")?,
            Err(_) => vec![8, 9],
        };
        let embedding_model = env::var("EMBEDDING_MODEL")
            .unwrap_or_else(|_| "google/embeddinggemma-300m".to_string());

        std::fs::create_dir_all(&data_dir).context("creating data dir")?;
        std::fs::create_dir_all(&outputs_dir).context("creating outputs dir")?;

        Ok(Self {
            data_dir,
            outputs_dir,
            n_topics: env_or("N_TOPICS", 30),
            migration_topic_id: env_or("MIGRATION_TOPIC_ID", 19),
            migration_threshold: env_or("MIGRATION_THRESHOLD", 0.25),
            keep_periods,
            greeting_percentile: env_or("GREETING_PERCENTILE", 6.2),
            ending_percentile: env_or("ENDING_PERCENTILE", 4.2),
            embedding_model,
        })
    }

    /// Convenience helper for derived path segments.
    pub fn join_data<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.data_dir.join(path)
    }

    /// Convenience helper for derived output path segments.
    pub fn join_output<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.outputs_dir.join(path)
    }

    /// Translated speeches, the pipeline input.
    pub fn translated_speeches(&self) -> PathBuf {
        self.join_data("intermed/speech_translated.parquet")
    }

    /// All cleaned speeches with topic probabilities.
    pub fn all_speeches(&self) -> PathBuf {
        self.join_data("final/full.parquet")
    }

    /// Cleaned speeches above the migration threshold.
    pub fn migration_speeches(&self) -> PathBuf {
        self.join_data("final/migration.parquet")
    }

    /// Migration speeches with an embedding column attached.
    pub fn migration_embedded(&self) -> PathBuf {
        self.join_data("final/migration_with_embeddings.parquet")
    }

    /// Vocabulary of the migration speeches with embeddings.
    pub fn vocab_embedded(&self) -> PathBuf {
        self.join_data("final/vocab_embeddings.parquet")
    }

    /// Trained topic model artefact.
    pub fn topic_model(&self) -> PathBuf {
        self.join_data("lda/final_model/model.json")
    }

    /// Bag-of-words corpus aligned with the cleaned speech table.
    pub fn topic_corpus(&self) -> PathBuf {
        self.join_data("lda/corpus_final.mm")
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_list(raw: &str) -> anyhow::Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().with_context(|| format!("invalid period {s:?}")))
        .collect()
}
