use anyhow::{anyhow, ensure, Result};

use atlas_core::normalize::document_text;
use atlas_core::config::Settings;
use atlas_core::traits::Embedder;
use atlas_core::{Corpus, Error};

use crate::flat::{normalize_l2, FlatIpIndex};
use crate::{Built, VectorIndex, DEFAULT_TOP_K};

impl VectorIndex {
    /// Build the index with an already loaded embedder.
    pub fn build(corpus: Corpus, embedder: Box<dyn Embedder>) -> Self {
        Self::build_with(corpus, move || Ok(embedder))
    }

    /// Build with the configured embedder and `search.top_k`.
    pub fn build_from_settings(corpus: Corpus, settings: &Settings) -> Self {
        Self::build_with(corpus, || atlas_embed::get_default_embedder(&settings.embed))
            .with_default_k(settings.search.top_k)
    }

    /// Build the index, loading the embedder only if there is something to
    /// embed.
    ///
    /// Never fails: an empty corpus leaves the index unset, and any loader,
    /// embedding or shape error is logged and also leaves it unset.
    pub fn build_with<F>(corpus: Corpus, load_embedder: F) -> Self
    where
        F: FnOnce() -> Result<Box<dyn Embedder>>,
    {
        let texts: Vec<String> = corpus.iter().map(document_text).collect();
        let built = if texts.is_empty() {
            tracing::warn!("no documents to index");
            None
        } else {
            match try_build(&texts, load_embedder) {
                Ok(built) => {
                    tracing::info!(docs = texts.len(), dim = built.index.dim(), "built vector index");
                    Some(built)
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to build vector index, search disabled");
                    None
                }
            }
        };
        Self { corpus, built, default_k: DEFAULT_TOP_K }
    }
}

fn try_build<F>(texts: &[String], load_embedder: F) -> std::result::Result<Built, Error>
where
    F: FnOnce() -> Result<Box<dyn Embedder>>,
{
    let unavailable = |e: anyhow::Error| Error::EmbeddingUnavailable(format!("{e:#}"));
    let embedder = load_embedder().map_err(unavailable)?;
    let vectors = embedder.embed_batch(texts).map_err(unavailable)?;
    let index = index_vectors(texts.len(), vectors).map_err(unavailable)?;
    Ok(Built { embedder, index })
}

fn index_vectors(expected: usize, mut vectors: Vec<Vec<f32>>) -> Result<FlatIpIndex> {
    ensure!(
        vectors.len() == expected,
        "embedder returned {} vectors for {} texts",
        vectors.len(),
        expected
    );
    let dim = vectors.first().map(Vec::len).ok_or_else(|| anyhow!("no vectors"))?;
    ensure!(dim > 0, "embedder returned zero-dimensional vectors");

    let mut index = FlatIpIndex::new(dim);
    for v in &mut vectors {
        normalize_l2(v);
        index.add(v)?;
    }
    Ok(index)
}
