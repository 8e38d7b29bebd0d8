use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use atlas_core::traits::Embedder;

/// Deterministic character-trigram embedder.
///
/// Text is split into lower-cased alphanumeric tokens, each token padded
/// with one space on both sides, and every character trigram is hashed
/// into one of `dim` buckets. Works for any script, needs no model files,
/// and gives stable vectors for tests and offline development.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub const DEFAULT_DIM: usize = 384;

    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in tokens(text) {
            let padded: Vec<char> = std::iter::once(' ')
                .chain(token.chars())
                .chain(std::iter::once(' '))
                .collect();
            for gram in padded.windows(3) {
                let mut hasher = XxHash64::with_seed(0);
                gram.hash(&mut hasher);
                let idx = (hasher.finish() % self.dim as u64) as usize;
                v[idx] += 1.0;
            }
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v { *x /= norm; }
        }
        v
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIM)
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

fn tokens(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_split_on_non_alphanumerics_and_lowercase() {
        assert_eq!(tokens("Dr. Amir-Khan, MON"), vec!["dr", "amir", "khan", "mon"]);
        assert_eq!(tokens("د. سارة"), vec!["د", "سارة"]);
        assert!(tokens(" .,; ").is_empty());
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let v = HashEmbedder::new(16).embed_text("");
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
