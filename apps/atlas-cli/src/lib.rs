//! Process setup shared by the `atlas-server` and `atlas-search` binaries.

use std::path::Path;

use tracing_subscriber::EnvFilter;

use atlas_core::config::Settings;
use atlas_core::load_corpus;
use atlas_vector::VectorIndex;

pub mod args;
pub mod http;

/// Installs the global subscriber: `RUST_LOG` if set, else `info`, written to stderr.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the configured corpus (relative paths resolve against `base`) and
/// builds the index over it. Never fails: a missing corpus or model yields an
/// index that answers every search with no hits.
pub fn build_index(settings: &Settings, base: &Path) -> VectorIndex {
    let path = settings.data.resolved_doctors_path(base);
    let corpus = load_corpus(&path);
    tracing::info!(path = %path.display(), docs = corpus.len(), "corpus loaded");

    let index = VectorIndex::build_from_settings(corpus, settings);
    if index.is_built() {
        tracing::info!(docs = index.len(), dim = index.dim().unwrap_or(0), "index ready");
    } else {
        tracing::warn!(docs = index.len(), "index not built; searches will return no results");
    }
    index
}
