#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Sparse lexical signal: vocabulary projection and cosine scoring over
//! inverted postings.
//!
//! The vocabulary and the per-recipe TF-IDF vectors are trained offline;
//! this crate only projects queries into that space and scores them. Recipes
//! with zero term overlap never enter the postings walk, so they are
//! implicitly scored 0 without being enumerated.

use std::collections::HashMap;

use anyhow::{bail, Result};
use savora_core::types::SparseVector;

/// The offline-trained term space: term -> index plus one IDF weight per
/// index. Terms absent from the vocabulary contribute zero weight to a query
/// projection; they never error.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    terms: HashMap<String, u32>,
    idf: Vec<f32>,
}

impl Vocabulary {
    pub fn new(terms: HashMap<String, u32>, idf: Vec<f32>) -> Result<Self> {
        for (term, &index) in &terms {
            if index as usize >= idf.len() {
                bail!("term {term:?} has index {index} outside idf table of len {}", idf.len());
            }
        }
        if idf.iter().any(|w| !w.is_finite() || *w < 0.0) {
            bail!("idf weights must be finite and non-negative");
        }
        Ok(Self { terms, idf })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.idf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    /// Project a normalized ingredient set into the term space: term
    /// frequency x IDF, L2-normalized, matching the offline vectorizer's
    /// transform. Multi-word ingredients contribute one count per word.
    #[must_use]
    pub fn project(&self, ingredients: &[String]) -> SparseVector {
        let mut counts: HashMap<u32, f32> = HashMap::new();
        for ingredient in ingredients {
            for word in ingredient.split_whitespace() {
                if let Some(&index) = self.terms.get(word) {
                    *counts.entry(index).or_insert(0.0) += 1.0;
                }
            }
        }
        let mut entries: Vec<(u32, f32)> = counts
            .into_iter()
            .map(|(index, tf)| (index, tf * self.idf[index as usize]))
            .filter(|(_, w)| *w > 0.0)
            .collect();
        entries.sort_by_key(|(index, _)| *index);
        let mut vector = SparseVector(entries);
        vector.normalize();
        vector
    }
}

/// Cosine scorer over the catalog's lexical vectors.
///
/// Catalog vectors are normalized once at construction, so the postings walk
/// accumulates dot products that already are cosines when the query side is
/// unit-length too.
#[derive(Debug, Clone)]
pub struct LexicalScorer {
    postings: HashMap<u32, Vec<(usize, f32)>>,
    recipe_count: usize,
}

impl LexicalScorer {
    /// Build inverted postings from per-recipe sparse vectors, indexed by
    /// recipe ordinal (position in the catalog).
    pub fn build(vectors: &[SparseVector]) -> Result<Self> {
        let mut postings: HashMap<u32, Vec<(usize, f32)>> = HashMap::new();
        for (ordinal, raw) in vectors.iter().enumerate() {
            if raw.0.iter().any(|(_, w)| !w.is_finite() || *w < 0.0) {
                bail!("recipe {ordinal} has a negative or non-finite lexical weight");
            }
            let mut vector = raw.clone();
            vector.normalize();
            for (index, weight) in vector.0 {
                if weight > 0.0 {
                    postings.entry(index).or_default().push((ordinal, weight));
                }
            }
        }
        Ok(Self {
            postings,
            recipe_count: vectors.len(),
        })
    }

    #[must_use]
    pub fn recipe_count(&self) -> usize {
        self.recipe_count
    }

    /// Score every recipe with nonzero term overlap against a unit-length
    /// query vector. Output maps recipe ordinal -> cosine in [0, 1]; absent
    /// ordinals scored exactly 0.
    #[must_use]
    pub fn score(&self, query: &SparseVector) -> HashMap<usize, f32> {
        let mut scores: HashMap<usize, f32> = HashMap::new();
        for (index, q_weight) in &query.0 {
            if let Some(list) = self.postings.get(index) {
                for (ordinal, r_weight) in list {
                    *scores.entry(*ordinal).or_insert(0.0) += q_weight * r_weight;
                }
            }
        }
        // Float accumulation can nudge a cosine a hair past 1.0.
        for value in scores.values_mut() {
            *value = value.clamp(0.0, 1.0);
        }
        scores
    }
}
