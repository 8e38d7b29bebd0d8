use atlas_core::normalize::query_text;
use atlas_core::SearchHit;

use crate::flat::normalize_l2;
use crate::VectorIndex;

impl VectorIndex {
    /// Top-`k` documents by cosine similarity, best first.
    ///
    /// `k` defaults to [`VectorIndex::default_k`]. Returns no hits when the
    /// index is not built, the query is blank, `k` is zero, or embedding the
    /// query fails. Never panics on degraded state.
    pub fn search(&self, query: &str, k: Option<usize>) -> Vec<SearchHit<'_>> {
        let Some(built) = &self.built else {
            return Vec::new();
        };
        let k = k.unwrap_or(self.default_k);
        let query = query_text(query);
        if k == 0 || query.trim().is_empty() {
            return Vec::new();
        }

        let mut q = match built.embedder.embed_batch(&[query.to_string()]) {
            Ok(mut vs) if vs.len() == 1 => vs.remove(0),
            Ok(vs) => {
                tracing::warn!(vectors = vs.len(), "embedder returned wrong batch size for query");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to embed query");
                return Vec::new();
            }
        };
        if q.len() != built.index.dim() {
            tracing::warn!(got = q.len(), expected = built.index.dim(), "query dimension mismatch");
            return Vec::new();
        }
        normalize_l2(&mut q);

        built
            .index
            .search(&q, k)
            .into_iter()
            .filter_map(|(position, score)| {
                self.corpus.get(position).map(|document| SearchHit { document, score, position })
            })
            .collect()
    }
}
