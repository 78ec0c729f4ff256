//! Query normalization and cache fingerprinting.
//!
//! Two requests with the same effective semantics must produce the same
//! fingerprint regardless of ingredient ordering, casing or whitespace, so
//! normalization happens here, once, before anything is scored or cached.

use std::collections::BTreeSet;
use std::hash::Hasher;

use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::error::{EngineError, Result};
use crate::types::RecommendRequest;

/// Input bounds applied during normalization. The engine fills these from
/// its configuration.
#[derive(Debug, Clone, Copy)]
pub struct QueryLimits {
    pub max_ingredients: usize,
    pub default_results: usize,
    pub max_results_cap: usize,
}

/// A request after trimming, lowercasing, deduplication and bounds checks.
/// Ingredients are sorted, so equality is order-independent by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    pub ingredients: Vec<String>,
    pub cuisine: Option<String>,
    pub diet: Option<String>,
    pub max_results: usize,
}

impl NormalizedQuery {
    /// Normalize and validate a raw request.
    ///
    /// Rejects an empty or oversized ingredient set and an out-of-range
    /// `max_results` with `InvalidInput` naming the violated constraint.
    pub fn from_request(req: &RecommendRequest, limits: &QueryLimits) -> Result<Self> {
        let mut set = BTreeSet::new();
        for raw in &req.ingredients {
            // A single entry may itself carry separator-joined items.
            for part in raw.split(['\n', ',', ';', '|']) {
                let cleaned = normalize_text(part);
                if !cleaned.is_empty() {
                    set.insert(cleaned);
                }
            }
        }
        if set.is_empty() {
            return Err(EngineError::InvalidInput(
                "at least one non-empty ingredient is required".to_string(),
            ));
        }
        if set.len() > limits.max_ingredients {
            return Err(EngineError::InvalidInput(format!(
                "at most {} ingredients allowed, got {}",
                limits.max_ingredients,
                set.len()
            )));
        }

        let max_results = req.max_results.unwrap_or(limits.default_results);
        if max_results == 0 || max_results > limits.max_results_cap {
            return Err(EngineError::InvalidInput(format!(
                "max_results must be in 1..={}, got {max_results}",
                limits.max_results_cap
            )));
        }

        Ok(Self {
            ingredients: set.into_iter().collect(),
            cuisine: normalize_filter(req.cuisine_filter.as_deref()),
            diet: normalize_filter(req.diet_filter.as_deref()),
            max_results,
        })
    }

    /// The space-joined form handed to the embedding provider; mirrors the
    /// format the dense vectors were trained on.
    #[must_use]
    pub fn joined_text(&self) -> String {
        self.ingredients.join(" ")
    }

    #[must_use]
    pub fn fingerprint(&self) -> QueryFingerprint {
        QueryFingerprint::of(self)
    }
}

/// Canonical cache key for a normalized query.
///
/// Equality and hashing use the canonical string, so a digest collision can
/// never alias two different queries onto one cache entry; the XxHash64
/// digest exists for compact logging only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryFingerprint {
    canonical: String,
}

impl QueryFingerprint {
    fn of(query: &NormalizedQuery) -> Self {
        let mut canonical = query.ingredients.join(",");
        canonical.push('|');
        canonical.push_str(query.cuisine.as_deref().unwrap_or(""));
        canonical.push('|');
        canonical.push_str(query.diet.as_deref().unwrap_or(""));
        canonical.push('|');
        canonical.push_str(&query.max_results.to_string());
        Self { canonical }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    #[must_use]
    pub fn digest(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(self.canonical.as_bytes());
        hasher.finish()
    }
}

impl std::fmt::Display for QueryFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.digest())
    }
}

/// Lowercase, strip punctuation to spaces, collapse runs of whitespace.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_space = true;
        }
    }
    out
}

fn normalize_filter(raw: Option<&str>) -> Option<String> {
    let cleaned = normalize_text(raw?);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> QueryLimits {
        QueryLimits {
            max_ingredients: 20,
            default_results: 10,
            max_results_cap: 50,
        }
    }

    fn request(ingredients: &[&str]) -> RecommendRequest {
        RecommendRequest {
            ingredients: ingredients.iter().map(|s| (*s).to_string()).collect(),
            ..RecommendRequest::default()
        }
    }

    #[test]
    fn normalization_dedupes_and_sorts() {
        let q = NormalizedQuery::from_request(
            &request(&["Tomatoes", "basil", "Basil", " mozzarella "]),
            &limits(),
        )
        .expect("valid");
        assert_eq!(q.ingredients, vec!["basil", "mozzarella", "tomatoes"]);
    }

    #[test]
    fn fingerprint_invariant_under_order_case_whitespace() {
        let a = NormalizedQuery::from_request(
            &request(&["Tomatoes", "basil", " mozzarella "]),
            &limits(),
        )
        .expect("valid");
        let b = NormalizedQuery::from_request(
            &request(&["mozzarella", "BASIL", "tomatoes"]),
            &limits(),
        )
        .expect("valid");
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_differs_on_filters_and_size() {
        let base = request(&["rice", "chicken"]);
        let q1 = NormalizedQuery::from_request(&base, &limits()).expect("valid");
        let mut with_cuisine = base.clone();
        with_cuisine.cuisine_filter = Some("Italian".to_string());
        let q2 = NormalizedQuery::from_request(&with_cuisine, &limits()).expect("valid");
        let mut smaller = base;
        smaller.max_results = Some(3);
        let q3 = NormalizedQuery::from_request(&smaller, &limits()).expect("valid");
        assert_ne!(q1.fingerprint(), q2.fingerprint());
        assert_ne!(q1.fingerprint(), q3.fingerprint());
    }

    #[test]
    fn separators_inside_one_entry_are_split() {
        let q = NormalizedQuery::from_request(&request(&["rice, chicken; peas"]), &limits())
            .expect("valid");
        assert_eq!(q.ingredients, vec!["chicken", "peas", "rice"]);
    }

    #[test]
    fn empty_set_is_rejected() {
        let err = NormalizedQuery::from_request(&request(&["  ", "\n", "--"]), &limits())
            .expect_err("must reject");
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn oversized_set_is_rejected() {
        let many: Vec<String> = (0..25).map(|i| format!("ingredient{i}")).collect();
        let req = RecommendRequest {
            ingredients: many,
            ..RecommendRequest::default()
        };
        let err = NormalizedQuery::from_request(&req, &limits()).expect_err("must reject");
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn max_results_out_of_range_is_rejected() {
        let mut req = request(&["rice"]);
        req.max_results = Some(0);
        assert!(NormalizedQuery::from_request(&req, &limits()).is_err());
        req.max_results = Some(51);
        assert!(NormalizedQuery::from_request(&req, &limits()).is_err());
    }

    #[test]
    fn blank_filter_normalizes_to_none() {
        let mut req = request(&["rice"]);
        req.cuisine_filter = Some("   ".to_string());
        req.diet_filter = Some("Vegan".to_string());
        let q = NormalizedQuery::from_request(&req, &limits()).expect("valid");
        assert_eq!(q.cuisine, None);
        assert_eq!(q.diet, Some("vegan".to_string()));
    }
}
