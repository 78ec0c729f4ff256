//! Engine Facade: the single entry point orchestrating encode, dual scoring,
//! fusion, ranking and the result cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use savora_core::config::EngineConfig;
use savora_core::error::{EngineError, Result};
use savora_core::query::NormalizedQuery;
use savora_core::traits::{AnnIndex, Clock, EmbeddingProvider, SystemClock};
use savora_core::types::{
    EngineHealth, RankedRecipe, Recipe, Recommendation, RecommendRequest,
};
use savora_semantic::{Metric, SemanticScorer};

use crate::cache::{CachedResult, ResultCache};
use crate::catalog::Catalog;
use crate::encoder::QueryEncoder;
use crate::{fusion, rank};

/// Catalog generation: the catalog and the index built over its vectors are
/// swapped together so scores always refer to one consistent vector space.
struct Generation {
    catalog: Arc<Catalog>,
    semantic: SemanticScorer<Arc<dyn AnnIndex>>,
}

pub struct RecipeEngine {
    config: EngineConfig,
    encoder: QueryEncoder<Arc<dyn EmbeddingProvider>>,
    state: RwLock<Option<Arc<Generation>>>,
    cache: ResultCache,
}

impl RecipeEngine {
    pub fn new(config: EngineConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_clock(config, embedder, Arc::new(SystemClock))
    }

    /// Like `new` but with an injected clock, for deterministic TTL tests.
    pub fn with_clock(
        config: EngineConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let timeout = Duration::from_millis(config.provider_timeout_ms);
        let cache = ResultCache::new(
            Duration::from_secs(config.cache.ttl_secs),
            config.cache.capacity,
            clock,
        );
        Self {
            encoder: QueryEncoder::new(embedder, timeout),
            state: RwLock::new(None),
            cache,
            config,
        }
    }

    /// Install a catalog and the index built over its dense vectors. Used
    /// for the initial load and for out-of-band administrative reloads; the
    /// result cache is cleared because hybrid scores are not comparable
    /// across catalog generations.
    pub fn load_catalog(&self, catalog: Catalog, index: Arc<dyn AnnIndex>, metric: Metric) {
        let size = catalog.len();
        let generation = Arc::new(Generation {
            catalog: Arc::new(catalog),
            semantic: SemanticScorer::new(index, metric),
        });
        *self.state.write() = Some(generation);
        self.cache.clear();
        info!(catalog_size = size, "catalog loaded");
    }

    /// The one logical operation exposed to the transport layer.
    pub async fn recommend(&self, request: &RecommendRequest) -> Result<Recommendation> {
        let started = std::time::Instant::now();
        let query = NormalizedQuery::from_request(request, &self.config.query_limits())?;
        let fingerprint = query.fingerprint();

        let (value, cache_hit) = self
            .cache
            .get_or_compute(&fingerprint, || self.run_pipeline(&query))
            .await?;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(
            fingerprint = %fingerprint,
            cache_hit,
            results = value.results.len(),
            elapsed_ms,
            "recommendation served"
        );
        Ok(Recommendation {
            results: value.results.clone(),
            total_candidates_considered: value.total_candidates_considered,
            cache_hit,
            elapsed_ms,
        })
    }

    /// Recommend recipes similar to an existing one, using its own
    /// ingredients as the query and excluding the seed from the results.
    pub async fn find_similar(
        &self,
        recipe_id: &str,
        max_results: Option<usize>,
    ) -> Result<Recommendation> {
        let seed = self
            .recipe(recipe_id)?
            .ok_or_else(|| EngineError::InvalidInput(format!("unknown recipe id {recipe_id:?}")))?;
        let wanted = max_results.unwrap_or(self.config.default_results);
        // One extra slot because the seed recipe will dominate its own
        // ingredient query.
        let request = RecommendRequest {
            ingredients: seed.ingredients.clone(),
            cuisine_filter: None,
            diet_filter: None,
            max_results: Some((wanted + 1).min(self.config.max_results_cap)),
        };
        let mut recommendation = self.recommend(&request).await?;
        recommendation.results.retain(|r| r.recipe.id != recipe_id);
        recommendation.results.truncate(wanted);
        Ok(recommendation)
    }

    async fn run_pipeline(&self, query: &NormalizedQuery) -> Result<Arc<CachedResult>> {
        let generation = self
            .state
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or(EngineError::CatalogNotLoaded)?;
        let catalog = &generation.catalog;

        let lexical_query = self
            .encoder
            .lexical_vector(catalog.vocabulary(), query);
        let dense_query = self.encoder.dense_vector(query).await?;

        let pool = self.config.candidate_pool(query.max_results);
        let timeout = Duration::from_millis(self.config.provider_timeout_ms);

        // The two signals have no data dependency; score them concurrently.
        let lexical_task = async { catalog.lexical_scorer().score(&lexical_query) };
        let semantic_task = async {
            match tokio::time::timeout(timeout, generation.semantic.score(&dense_query, pool)).await
            {
                Ok(Ok(scores)) => Ok(scores),
                Ok(Err(e)) => Err(EngineError::IndexUnavailable(e.to_string())),
                Err(_) => Err(EngineError::IndexUnavailable(format!(
                    "index query timed out after {timeout:?}"
                ))),
            }
        };
        let (lexical_scores, semantic_scores) = tokio::join!(lexical_task, semantic_task);
        let semantic_scores = semantic_scores?;

        // Re-key semantic scores by catalog ordinal; an id the index still
        // knows but the catalog no longer carries is skipped.
        let mut semantic_by_ordinal: HashMap<usize, f32> =
            HashMap::with_capacity(semantic_scores.len());
        for (id, score) in semantic_scores {
            match catalog.ordinal_of(&id) {
                Some(ordinal) => {
                    semantic_by_ordinal.insert(ordinal, score);
                }
                None => warn!(recipe_id = %id, "index returned id missing from catalog"),
            }
        }

        let fused = fusion::fuse(
            &lexical_scores,
            &semantic_by_ordinal,
            self.config.lexical_weight,
        );
        let total_candidates_considered = fused.len();
        let survivors = fusion::apply_filters(
            fused,
            catalog,
            query.cuisine.as_deref(),
            query.diet.as_deref(),
        );
        let ranked = rank::rank(survivors, catalog, query.max_results);

        let results: Vec<RankedRecipe> = ranked
            .into_iter()
            .map(|c| RankedRecipe {
                recipe: catalog.recipe_at(c.ordinal).clone(),
                lexical_score: c.lexical,
                semantic_score: c.semantic,
                hybrid_score: c.hybrid,
            })
            .collect();

        Ok(Arc::new(CachedResult {
            results,
            total_candidates_considered,
        }))
    }

    /// Out-of-band observability hook.
    #[must_use]
    pub fn health(&self) -> EngineHealth {
        let state = self.state.read();
        EngineHealth {
            loaded: state.is_some(),
            catalog_size: state.as_ref().map_or(0, |g| g.catalog.len()),
            cache_size: self.cache.len(),
            cache_hit_rate: self.cache.hit_rate(),
        }
    }

    /// Administrative hook, out of the request hot path.
    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("result cache cleared");
    }

    pub fn recipe(&self, id: &str) -> Result<Option<Recipe>> {
        let state = self.state.read();
        let generation = state.as_ref().ok_or(EngineError::CatalogNotLoaded)?;
        Ok(generation.catalog.get(id).cloned())
    }

    /// Distinct cuisine tags available for filtering.
    pub fn cuisines(&self) -> Result<Vec<String>> {
        let state = self.state.read();
        let generation = state.as_ref().ok_or(EngineError::CatalogNotLoaded)?;
        Ok(generation.catalog.cuisines())
    }

    /// Distinct diet tags available for filtering.
    pub fn diets(&self) -> Result<Vec<String>> {
        let state = self.state.read();
        let generation = state.as_ref().ok_or(EngineError::CatalogNotLoaded)?;
        Ok(generation.catalog.diets())
    }
}
