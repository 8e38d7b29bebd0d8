//! Exact (brute-force) inner-product index over a row-major `f32` matrix.

use std::cmp::Ordering;

pub struct FlatIpIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIpIndex {
    pub fn new(dim: usize) -> Self {
        Self { dim, data: Vec::new() }
    }

    pub fn dim(&self) -> usize { self.dim }

    pub fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn add(&mut self, vector: &[f32]) -> anyhow::Result<()> {
        anyhow::ensure!(
            vector.len() == self.dim,
            "vector has dimension {}, index expects {}",
            vector.len(),
            self.dim
        );
        self.data.extend_from_slice(vector);
        Ok(())
    }

    /// Up to `k` `(position, score)` pairs, best first.
    ///
    /// Ties keep ascending position order. Non-finite scores are dropped.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        if k == 0 || query.len() != self.dim || self.dim == 0 {
            return Vec::new();
        }
        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dim)
            .map(|row| dot(row, query))
            .enumerate()
            .filter(|(_, s)| s.is_finite())
            .collect();

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_score_desc);
            scored.truncate(k);
        }
        scored.sort_by(by_score_desc);
        scored
    }
}

fn by_score_desc(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Scale `v` to unit Euclidean norm in place; zero vectors are left as is.
pub fn normalize_l2(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() { *x /= norm; }
    }
}
