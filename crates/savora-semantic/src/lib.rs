#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Dense semantic signal: candidate retrieval through an injected ANN index
//! and distance-to-similarity conversion.
//!
//! The scorer only sees the index's top-N pool; anything outside the pool is
//! treated as semantic score 0 by the fusion stage. That recall gap is a
//! deliberate accuracy/performance trade-off, tuned via the candidate pool
//! configuration rather than hidden.

use std::collections::HashMap;

use anyhow::{bail, Result};
use async_trait::async_trait;
use savora_core::traits::{AnnIndex, Neighbor};
use savora_core::types::RecipeId;

/// The distance convention of the backing index. Each variant maps the
/// reported distance into a similarity in [0, 1] with a monotone decreasing
/// transform (increasing for `InnerProduct`, where bigger already is better).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    /// The index reports `1 - cosine` in [0, 2].
    #[default]
    CosineDistance,
    /// The index reports the raw inner product of unit vectors, FAISS-style;
    /// already a similarity.
    InnerProduct,
    /// The index reports L2 distance in [0, inf).
    Euclidean,
}

impl Metric {
    #[must_use]
    pub fn similarity(self, distance: f32) -> f32 {
        match self {
            Metric::CosineDistance => (1.0 - distance).clamp(0.0, 1.0),
            Metric::InnerProduct => distance.clamp(0.0, 1.0),
            Metric::Euclidean => (1.0 / (1.0 + distance.max(0.0))).clamp(0.0, 1.0),
        }
    }
}

/// Scores the semantic side of a query: fetch the top-`k` pool from the
/// index and convert distances.
pub struct SemanticScorer<I> {
    index: I,
    metric: Metric,
}

impl<I: AnnIndex> SemanticScorer<I> {
    pub fn new(index: I, metric: Metric) -> Self {
        Self { index, metric }
    }

    /// Map of recipe id -> similarity in (0, 1] for the retrieved pool.
    /// Non-positive similarities are dropped: a candidate the index deems
    /// unrelated is treated the same as one it never returned.
    pub async fn score(&self, query: &[f32], k: usize) -> Result<HashMap<RecipeId, f32>> {
        let neighbors = self.index.query(query, k).await?;
        let mut scores = HashMap::with_capacity(neighbors.len());
        for n in neighbors {
            let sim = self.metric.similarity(n.distance);
            if sim <= 0.0 {
                continue;
            }
            // An id can surface once per index segment; keep the best.
            scores
                .entry(n.recipe_id)
                .and_modify(|s: &mut f32| *s = s.max(sim))
                .or_insert(sim);
        }
        Ok(scores)
    }
}

/// Exact in-memory index over unit-normalized vectors.
///
/// Linear scan, deterministic ordering (distance, then id). This is the
/// bundled implementation for the CLI and for tests; production deployments
/// inject a real approximate index behind the same trait.
pub struct FlatIndex {
    ids: Vec<RecipeId>,
    vectors: Vec<Vec<f32>>,
    dim: usize,
}

impl FlatIndex {
    /// Build from `(id, vector)` pairs. Vectors are normalized here, so the
    /// producer does not have to emit unit vectors.
    pub fn build(entries: Vec<(RecipeId, Vec<f32>)>) -> Result<Self> {
        let dim = entries.first().map_or(0, |(_, v)| v.len());
        let mut ids = Vec::with_capacity(entries.len());
        let mut vectors = Vec::with_capacity(entries.len());
        for (id, mut vector) in entries {
            if vector.len() != dim {
                bail!(
                    "vector for {id:?} has dim {}, expected {dim}",
                    vector.len()
                );
            }
            normalize(&mut vector);
            ids.push(id);
            vectors.push(vector);
        }
        Ok(Self { ids, vectors, dim })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[async_trait]
impl AnnIndex for FlatIndex {
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if self.ids.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if vector.len() != self.dim {
            bail!("query dim {} does not match index dim {}", vector.len(), self.dim);
        }
        let mut query = vector.to_vec();
        normalize(&mut query);
        let mut neighbors: Vec<Neighbor> = self
            .ids
            .iter()
            .zip(&self.vectors)
            .map(|(id, v)| Neighbor {
                recipe_id: id.clone(),
                distance: 1.0 - dot(&query, v),
            })
            .collect();
        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.recipe_id.cmp(&b.recipe_id))
        });
        neighbors.truncate(k);
        Ok(neighbors)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn normalize(v: &mut [f32]) {
    let norm = dot(v, v).sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
