//! Vector search over the doctor profile corpus.
//!
//! [`VectorIndex`] is built once at startup ([`VectorIndex::build`]) and is
//! read-only afterwards, so it can be shared behind an `Arc` and searched
//! from any number of threads without locking.

use std::fmt;

use atlas_core::traits::Embedder;
use atlas_core::Corpus;

pub mod flat;
pub mod index_build;
pub mod search;

pub use atlas_core::SearchHit;
pub use flat::{normalize_l2, FlatIpIndex};

pub const DEFAULT_TOP_K: usize = 3;

/// Owns the corpus, the embedder and the similarity index.
///
/// The embedder and index exist together or not at all: when the corpus is
/// empty or the build failed, the index is absent and every search returns
/// no hits.
pub struct VectorIndex {
    corpus: Corpus,
    built: Option<Built>,
    default_k: usize,
}

struct Built {
    embedder: Box<dyn Embedder>,
    index: FlatIpIndex,
}

impl VectorIndex {
    /// `k` used when a search does not pass one.
    #[must_use]
    pub fn with_default_k(mut self, k: usize) -> Self {
        self.default_k = k.max(1);
        self
    }

    pub fn default_k(&self) -> usize { self.default_k }

    pub fn is_built(&self) -> bool { self.built.is_some() }

    /// Number of documents in the corpus (indexed or not).
    pub fn len(&self) -> usize { self.corpus.len() }

    pub fn is_empty(&self) -> bool { self.corpus.is_empty() }

    pub fn dim(&self) -> Option<usize> { self.built.as_ref().map(|b| b.index.dim()) }

    pub fn corpus(&self) -> &Corpus { &self.corpus }
}

impl fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorIndex")
            .field("docs", &self.corpus.len())
            .field("built", &self.is_built())
            .field("dim", &self.dim())
            .field("default_k", &self.default_k)
            .finish()
    }
}
