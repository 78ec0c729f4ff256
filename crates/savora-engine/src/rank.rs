//! Ranker: deterministic total order over fused candidates.
//!
//! Hybrid score descending, then lower cook time, then lower difficulty
//! rank, then lexicographically smaller id. The full chain guarantees
//! identical inputs always rank identically, which the cache and the tests
//! rely on.

use crate::catalog::Catalog;
use crate::fusion::FusedCandidate;

#[must_use]
pub fn rank(
    mut candidates: Vec<FusedCandidate>,
    catalog: &Catalog,
    max_results: usize,
) -> Vec<FusedCandidate> {
    candidates.sort_by(|a, b| {
        b.hybrid.total_cmp(&a.hybrid).then_with(|| {
            let ra = catalog.recipe_at(a.ordinal);
            let rb = catalog.recipe_at(b.ordinal);
            ra.cook_time_minutes
                .cmp(&rb.cook_time_minutes)
                .then_with(|| ra.difficulty.cmp(&rb.difficulty))
                .then_with(|| ra.id.cmp(&rb.id))
        })
    });
    candidates.truncate(max_results);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogArtifact, RecipeArtifact};
    use savora_core::types::{Difficulty, Recipe};
    use std::collections::HashMap;

    fn catalog() -> Catalog {
        let recipe = |id: &str, cook: u32, difficulty: Difficulty| RecipeArtifact {
            recipe: Recipe {
                id: id.to_string(),
                name: id.to_string(),
                ingredients: vec![],
                cuisine: String::new(),
                diets: vec![],
                cook_time_minutes: cook,
                difficulty,
                description: String::new(),
            },
            lexical: vec![],
            embedding: vec![0.0],
        };
        let artifact = CatalogArtifact {
            vocabulary: HashMap::new(),
            idf: vec![],
            embedding_dim: 1,
            recipes: vec![
                recipe("zebra_cake", 30, Difficulty::Easy),
                recipe("apple_pie", 30, Difficulty::Easy),
                recipe("quick_toast", 5, Difficulty::Easy),
                recipe("slow_roast", 5, Difficulty::Hard),
            ],
        };
        Catalog::from_artifact(&artifact).expect("catalog")
    }

    fn candidate(ordinal: usize, hybrid: f32) -> FusedCandidate {
        FusedCandidate {
            ordinal,
            lexical: hybrid,
            semantic: hybrid,
            hybrid,
        }
    }

    #[test]
    fn orders_by_hybrid_descending() {
        let ranked = rank(
            vec![candidate(0, 0.2), candidate(2, 0.9), candidate(1, 0.5)],
            &catalog(),
            10,
        );
        let scores: Vec<f32> = ranked.iter().map(|c| c.hybrid).collect();
        assert_eq!(scores, vec![0.9, 0.5, 0.2]);
    }

    #[test]
    fn tie_breaks_on_cook_time_then_difficulty_then_id() {
        // All four share the same hybrid score.
        let ranked = rank(
            vec![
                candidate(0, 0.5), // zebra_cake, 30 min, easy
                candidate(1, 0.5), // apple_pie, 30 min, easy
                candidate(2, 0.5), // quick_toast, 5 min, easy
                candidate(3, 0.5), // slow_roast, 5 min, hard
            ],
            &catalog(),
            10,
        );
        assert_eq!(
            ranked.iter().map(|c| c.ordinal).collect::<Vec<_>>(),
            vec![2, 3, 1, 0],
            "cook time beats difficulty beats id"
        );
    }

    #[test]
    fn truncates_to_max_results() {
        let ranked = rank(
            vec![candidate(0, 0.3), candidate(1, 0.2), candidate(2, 0.1)],
            &catalog(),
            2,
        );
        assert_eq!(ranked.len(), 2);
    }
}
