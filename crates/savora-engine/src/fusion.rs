//! Fusion & Filter: merge the two per-recipe score maps into one hybrid
//! score, then apply categorical predicates.
//!
//! Filtering happens strictly after scoring so a recipe's hybrid score is
//! identical across filtered and unfiltered runs of the same query.

use std::collections::HashMap;

use crate::catalog::Catalog;

/// A candidate surviving fusion, keyed by catalog ordinal.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedCandidate {
    pub ordinal: usize,
    pub lexical: f32,
    pub semantic: f32,
    pub hybrid: f32,
}

/// Union both score maps; a recipe absent from one side uses 0 for that
/// term. `lexical_weight` is the configured blend α:
/// `hybrid = α * lexical + (1 - α) * semantic`.
/// A candidate whose hybrid score lands at exactly 0 is no candidate at all
/// and is dropped before filtering or counting.
#[must_use]
pub fn fuse(
    lexical: &HashMap<usize, f32>,
    semantic: &HashMap<usize, f32>,
    lexical_weight: f32,
) -> Vec<FusedCandidate> {
    let mut merged: HashMap<usize, (f32, f32)> = HashMap::with_capacity(lexical.len());
    for (&ordinal, &score) in lexical {
        merged.entry(ordinal).or_insert((0.0, 0.0)).0 = score;
    }
    for (&ordinal, &score) in semantic {
        merged.entry(ordinal).or_insert((0.0, 0.0)).1 = score;
    }
    merged
        .into_iter()
        .map(|(ordinal, (lex, sem))| FusedCandidate {
            ordinal,
            lexical: lex,
            semantic: sem,
            hybrid: (lexical_weight * lex + (1.0 - lexical_weight) * sem).clamp(0.0, 1.0),
        })
        .filter(|c| c.hybrid > 0.0)
        .collect()
}

/// Drop candidates whose tags do not satisfy the filters. Cuisine matches
/// case-insensitively against the recipe's cuisine tag; diet must be one of
/// the recipe's diet tags. An empty survivor set is a valid empty result.
#[must_use]
pub fn apply_filters(
    candidates: Vec<FusedCandidate>,
    catalog: &Catalog,
    cuisine: Option<&str>,
    diet: Option<&str>,
) -> Vec<FusedCandidate> {
    candidates
        .into_iter()
        .filter(|c| {
            let recipe = catalog.recipe_at(c.ordinal);
            if let Some(wanted) = cuisine {
                if !recipe.cuisine.eq_ignore_ascii_case(wanted) {
                    return false;
                }
            }
            if let Some(wanted) = diet {
                if !recipe.diets.iter().any(|d| d.eq_ignore_ascii_case(wanted)) {
                    return false;
                }
            }
            true
        })
        .collect()
}
