//! Domain types shared by the lexical, semantic and engine crates.

use serde::{Deserialize, Serialize};

pub type RecipeId = String;

/// Difficulty rank. The derived `Ord` (Easy < Medium < Hard) is part of the
/// ranking contract: lower difficulty wins ties.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

/// A recipe record. Immutable after catalog load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub ingredients: Vec<String>,
    pub cuisine: String,
    #[serde(default)]
    pub diets: Vec<String>,
    pub cook_time_minutes: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub description: String,
}

/// Sparse term-weight vector over a fixed vocabulary.
///
/// Entries are `(term index, weight)` pairs sorted by index with strictly
/// positive weights; absent terms weigh zero. The empty vector is valid and
/// scores 0 against everything.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SparseVector(pub Vec<(u32, f32)>);

impl SparseVector {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Dot product of two index-sorted sparse vectors.
    #[must_use]
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j, mut sum) = (0usize, 0usize, 0f32);
        while i < self.0.len() && j < other.0.len() {
            match self.0[i].0.cmp(&other.0[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.0[i].1 * other.0[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// L2 norm of the stored weights.
    #[must_use]
    pub fn norm(&self) -> f32 {
        self.0.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    /// Scale weights so the vector has unit norm. A zero vector stays zero.
    pub fn normalize(&mut self) {
        let n = self.norm();
        if n > f32::EPSILON {
            for (_, w) in &mut self.0 {
                *w /= n;
            }
        }
    }
}

/// Per-request scoring record, discarded after ranking.
/// All three scores are in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub recipe_id: RecipeId,
    pub lexical_score: f32,
    pub semantic_score: f32,
    pub hybrid_score: f32,
}

/// One ranked result with the recipe metadata the caller renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedRecipe {
    pub recipe: Recipe,
    pub lexical_score: f32,
    pub semantic_score: f32,
    pub hybrid_score: f32,
}

/// The full response of a `recommend` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub results: Vec<RankedRecipe>,
    /// Pre-filter size of the candidate union from both scorers.
    pub total_candidates_considered: usize,
    pub cache_hit: bool,
    pub elapsed_ms: u64,
}

/// Raw caller request, prior to normalization.
#[derive(Debug, Clone, Default)]
pub struct RecommendRequest {
    pub ingredients: Vec<String>,
    pub cuisine_filter: Option<String>,
    pub diet_filter: Option<String>,
    /// `None` takes the configured default.
    pub max_results: Option<usize>,
}

/// Snapshot returned by the engine's `health()` hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineHealth {
    pub loaded: bool,
    pub catalog_size: usize,
    pub cache_size: usize,
    pub cache_hit_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_dot_skips_disjoint_terms() {
        let a = SparseVector(vec![(0, 1.0), (3, 2.0), (7, 1.0)]);
        let b = SparseVector(vec![(1, 5.0), (3, 0.5), (8, 1.0)]);
        assert!((a.dot(&b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_scores_zero() {
        let zero = SparseVector::default();
        let b = SparseVector(vec![(0, 1.0)]);
        assert_eq!(zero.dot(&b), 0.0);
    }

    #[test]
    fn normalize_produces_unit_norm() {
        let mut v = SparseVector(vec![(0, 3.0), (1, 4.0)]);
        v.normalize();
        assert!((v.norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn difficulty_orders_easy_first() {
        assert!(Difficulty::Easy < Difficulty::Medium);
        assert!(Difficulty::Medium < Difficulty::Hard);
    }
}
