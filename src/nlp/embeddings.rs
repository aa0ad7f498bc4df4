//! Sentence embeddings of speeches and vocabulary built on fastembed.

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::{
    config::Settings,
    data::{embedded, speeches},
    nlp::vocab::vocabulary,
};

/// Anything that maps texts to dense vectors of a fixed dimension.
pub trait TextEmbedder {
    fn embed(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;
}

#[cfg(feature = "embeddings")]
mod local {
    use anyhow::Result;
    use fastembed::{InitOptions, TextEmbedding};
    use tracing::{info, warn};

    use super::TextEmbedder;

    const BATCH_SIZE: usize = 32;

    /// Local ONNX encoder resolved from a model code.
    pub struct FastEmbedder {
        inner: TextEmbedding,
    }

    impl FastEmbedder {
        /// Load `model_code`, falling back to the library default when unknown.
        pub fn new(model_code: &str) -> Result<Self> {
            let known = TextEmbedding::list_supported_models()
                .into_iter()
                .find(|info| info.model_code.eq_ignore_ascii_case(model_code));
            let inner = match known {
                Some(info) => {
                    info!(model = %info.model_code, dim = info.dim, "loading embedding model");
                    TextEmbedding::try_new(InitOptions::new(info.model))?
                }
                None => {
                    warn!(model = model_code, "unknown embedding model; using default");
                    TextEmbedding::try_new(Default::default())?
                }
            };
            Ok(Self { inner })
        }
    }

    impl TextEmbedder for FastEmbedder {
        fn embed(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(self.inner.embed(texts.to_vec(), Some(BATCH_SIZE))?)
        }
    }
}

#[cfg(feature = "embeddings")]
pub use local::FastEmbedder;

/// Embed the migration speeches and their vocabulary with `embedder`.
///
/// The embedding column is named after the configured model so several
/// models can sit side by side in later tables.
#[instrument(skip_all)]
pub fn embed_with(settings: &Settings, embedder: &mut dyn TextEmbedder) -> Result<()> {
    let table = speeches::read_parquet(&settings.migration_speeches())?;
    if table.is_empty() {
        warn!("no migration speeches to embed");
        return Ok(());
    }
    let texts: Vec<&str> = table.iter().map(|r| r.translated_text.as_str()).collect();
    let vectors = embedder.embed(&texts)?;
    embedded::write_embedded_speeches(
        &table,
        &vectors,
        &settings.embedding_model,
        &settings.migration_embedded(),
    )?;

    let words = vocabulary(&table);
    let refs: Vec<&str> = words.iter().map(String::as_str).collect();
    let word_vectors = embedder.embed(&refs)?;
    embedded::write_vocab_table(
        &words,
        &word_vectors,
        &settings.embedding_model,
        &settings.vocab_embedded(),
    )?;
    info!(
        speeches = vectors.len(),
        words = words.len(),
        "embedded speeches and vocabulary"
    );
    Ok(())
}

/// Embed with the configured local model when the `embeddings` feature is on.
pub fn embed_speeches(settings: &Settings) -> Result<()> {
    #[cfg(feature = "embeddings")]
    {
        let mut embedder = FastEmbedder::new(&settings.embedding_model)?;
        embed_with(settings, &mut embedder)
    }
    #[cfg(not(feature = "embeddings"))]
    {
        warn!(
            model = %settings.embedding_model,
            "built without the `embeddings` feature; skipping"
        );
        Ok(())
    }
}
