//! Immutable recipe catalog plus its precomputed lexical vectors.
//!
//! The catalog is loaded once from a JSON artifact produced by the offline
//! training pipeline and is read-only afterwards; reload is an explicit
//! administrative swap on the engine, never part of request handling.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use savora_core::types::{Recipe, RecipeId, SparseVector};
use savora_lexical::{LexicalScorer, Vocabulary};

/// On-disk schema, versioned by the training collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogArtifact {
    /// Term -> index into `idf`.
    pub vocabulary: HashMap<String, u32>,
    pub idf: Vec<f32>,
    pub embedding_dim: usize,
    pub recipes: Vec<RecipeArtifact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeArtifact {
    #[serde(flatten)]
    pub recipe: Recipe,
    /// Precomputed TF-IDF vector, `(term index, weight)` pairs.
    pub lexical: Vec<(u32, f32)>,
    /// Precomputed dense embedding; consumed by the ANN index build, not
    /// kept in memory by the catalog.
    pub embedding: Vec<f32>,
}

impl CatalogArtifact {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog artifact {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse catalog artifact {}", path.display()))
    }

    /// `(id, embedding)` pairs for building the dense index.
    #[must_use]
    pub fn embedding_entries(&self) -> Vec<(RecipeId, Vec<f32>)> {
        self.recipes
            .iter()
            .map(|r| (r.recipe.id.clone(), r.embedding.clone()))
            .collect()
    }
}

/// Validated in-memory catalog: recipe records, id lookup and the lexical
/// scorer built from the artifact's sparse vectors.
pub struct Catalog {
    recipes: Vec<Recipe>,
    by_id: HashMap<RecipeId, usize>,
    vocabulary: Vocabulary,
    lexical: LexicalScorer,
}

impl Catalog {
    pub fn from_artifact(artifact: &CatalogArtifact) -> Result<Self> {
        let vocabulary = Vocabulary::new(artifact.vocabulary.clone(), artifact.idf.clone())?;

        let mut recipes = Vec::with_capacity(artifact.recipes.len());
        let mut by_id = HashMap::with_capacity(artifact.recipes.len());
        let mut vectors = Vec::with_capacity(artifact.recipes.len());
        for entry in &artifact.recipes {
            if entry.recipe.id.is_empty() {
                bail!("recipe with empty id in artifact");
            }
            if entry.embedding.len() != artifact.embedding_dim {
                bail!(
                    "recipe {:?} has embedding dim {}, artifact declares {}",
                    entry.recipe.id,
                    entry.embedding.len(),
                    artifact.embedding_dim
                );
            }
            if by_id
                .insert(entry.recipe.id.clone(), recipes.len())
                .is_some()
            {
                bail!("duplicate recipe id {:?} in artifact", entry.recipe.id);
            }
            recipes.push(entry.recipe.clone());
            let mut lexical = entry.lexical.clone();
            lexical.sort_by_key(|(index, _)| *index);
            vectors.push(SparseVector(lexical));
        }
        let lexical = LexicalScorer::build(&vectors)?;

        Ok(Self {
            recipes,
            by_id,
            vocabulary,
            lexical,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    #[must_use]
    pub fn lexical_scorer(&self) -> &LexicalScorer {
        &self.lexical
    }

    #[must_use]
    pub fn recipe_at(&self, ordinal: usize) -> &Recipe {
        &self.recipes[ordinal]
    }

    #[must_use]
    pub fn ordinal_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.ordinal_of(id).map(|i| &self.recipes[i])
    }

    /// Distinct cuisine tags, sorted, for the caller's filter options.
    #[must_use]
    pub fn cuisines(&self) -> Vec<String> {
        let set: BTreeSet<String> = self
            .recipes
            .iter()
            .filter(|r| !r.cuisine.is_empty())
            .map(|r| r.cuisine.clone())
            .collect();
        set.into_iter().collect()
    }

    /// Distinct diet tags, sorted.
    #[must_use]
    pub fn diets(&self) -> Vec<String> {
        let set: BTreeSet<String> = self
            .recipes
            .iter()
            .flat_map(|r| r.diets.iter().cloned())
            .collect();
        set.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use savora_core::types::Difficulty;

    fn artifact() -> CatalogArtifact {
        CatalogArtifact {
            vocabulary: HashMap::from([("tomato".to_string(), 0), ("rice".to_string(), 1)]),
            idf: vec![1.0, 1.0],
            embedding_dim: 2,
            recipes: vec![
                RecipeArtifact {
                    recipe: Recipe {
                        id: "caprese_salad".to_string(),
                        name: "Caprese Salad".to_string(),
                        ingredients: vec!["tomato".to_string()],
                        cuisine: "Italian".to_string(),
                        diets: vec!["vegetarian".to_string()],
                        cook_time_minutes: 10,
                        difficulty: Difficulty::Easy,
                        description: String::new(),
                    },
                    lexical: vec![(0, 1.0)],
                    embedding: vec![1.0, 0.0],
                },
                RecipeArtifact {
                    recipe: Recipe {
                        id: "fried_rice".to_string(),
                        name: "Fried Rice".to_string(),
                        ingredients: vec!["rice".to_string()],
                        cuisine: "Chinese".to_string(),
                        diets: vec!["vegan".to_string()],
                        cook_time_minutes: 20,
                        difficulty: Difficulty::Medium,
                        description: String::new(),
                    },
                    lexical: vec![(1, 1.0)],
                    embedding: vec![0.0, 1.0],
                },
            ],
        }
    }

    #[test]
    fn builds_and_indexes_by_id() {
        let catalog = Catalog::from_artifact(&artifact()).expect("build");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("fried_rice").map(|r| r.cuisine.as_str()), Some("Chinese"));
        assert_eq!(catalog.cuisines(), vec!["Chinese", "Italian"]);
        assert_eq!(catalog.diets(), vec!["vegan", "vegetarian"]);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut a = artifact();
        a.recipes[1].recipe.id = "caprese_salad".to_string();
        assert!(Catalog::from_artifact(&a).is_err());
    }

    #[test]
    fn rejects_embedding_dim_mismatch() {
        let mut a = artifact();
        a.recipes[0].embedding = vec![1.0, 0.0, 0.0];
        assert!(Catalog::from_artifact(&a).is_err());
    }

    #[test]
    fn artifact_round_trips_through_json() {
        let a = artifact();
        let json = serde_json::to_string(&a).expect("serialize");
        let back: CatalogArtifact = serde_json::from_str(&json).expect("parse");
        assert_eq!(back.recipes.len(), 2);
        assert_eq!(back.recipes[0].recipe.id, "caprese_salad");
    }
}
