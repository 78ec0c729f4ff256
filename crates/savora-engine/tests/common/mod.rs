//! Shared fixtures: a small catalog with predictable vectors, a
//! deterministic axis embedder, and a manual clock.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use savora_core::config::EngineConfig;
use savora_core::traits::{Clock, EmbeddingProvider};
use savora_core::types::{Difficulty, Recipe};
use savora_engine::catalog::{CatalogArtifact, RecipeArtifact};
use savora_engine::{Catalog, RecipeEngine};
use savora_lexical::Vocabulary;
use savora_semantic::{FlatIndex, Metric};

pub const EMBED_DIM: usize = 8;

/// Maps known ingredient words onto fixed axes so test similarities are
/// exact: unrelated ingredient sets are exactly orthogonal.
fn axis_of(word: &str) -> Option<usize> {
    match word {
        "basil" => Some(0),
        "mozzarella" => Some(1),
        "tomato" | "tomatoes" => Some(2),
        "chicken" => Some(3),
        "rice" => Some(4),
        "soy" => Some(5),
        "pea" => Some(6),
        _ => None,
    }
}

pub fn axis_embed(text: &str) -> Vec<f32> {
    let mut v = vec![0f32; EMBED_DIM];
    for word in text.split_whitespace() {
        if let Some(axis) = axis_of(word) {
            v[axis] += 1.0;
        }
    }
    v
}

pub struct AxisEmbedder;

#[async_trait]
impl EmbeddingProvider for AxisEmbedder {
    fn dim(&self) -> usize {
        EMBED_DIM
    }

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(axis_embed(text))
    }
}

/// Adds latency in front of another provider so concurrent requests overlap
/// while the leader is still computing.
pub struct SlowEmbedder<P> {
    inner: P,
    delay: Duration,
}

impl<P> SlowEmbedder<P> {
    pub fn new(inner: P, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for SlowEmbedder<P> {
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        tokio::time::sleep(self.delay).await;
        self.inner.embed(text).await
    }
}

pub struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        })
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock()
    }
}

fn recipe(
    id: &str,
    ingredients: &[&str],
    cuisine: &str,
    diets: &[&str],
    cook: u32,
    difficulty: Difficulty,
) -> Recipe {
    Recipe {
        id: id.to_string(),
        name: id.replace('_', " "),
        ingredients: ingredients.iter().map(|s| (*s).to_string()).collect(),
        cuisine: cuisine.to_string(),
        diets: diets.iter().map(|s| (*s).to_string()).collect(),
        cook_time_minutes: cook,
        difficulty,
        description: String::new(),
    }
}

pub fn artifact() -> CatalogArtifact {
    let vocabulary: HashMap<String, u32> = [
        ("basil", 0u32),
        ("mozzarella", 1),
        ("tomato", 2),
        ("chicken", 3),
        ("rice", 4),
        ("soy", 5),
        ("pea", 6),
    ]
    .into_iter()
    .map(|(t, i)| (t.to_string(), i))
    .collect();
    let idf = vec![1.0; 7];
    let vocab = Vocabulary::new(vocabulary.clone(), idf.clone()).expect("vocabulary");

    let recipes = vec![
        recipe(
            "caprese_salad",
            &["tomato", "basil", "mozzarella"],
            "Italian",
            &["vegetarian", "gluten-free"],
            10,
            Difficulty::Easy,
        ),
        recipe(
            "margherita_pizza",
            &["tomato", "basil", "mozzarella"],
            "Italian",
            &["vegetarian"],
            25,
            Difficulty::Medium,
        ),
        recipe(
            "chicken_fried_rice",
            &["rice", "chicken", "soy", "pea"],
            "Chinese",
            &[],
            20,
            Difficulty::Easy,
        ),
        recipe(
            "veggie_fried_rice",
            &["rice", "soy", "pea"],
            "Chinese",
            &["vegan"],
            15,
            Difficulty::Easy,
        ),
    ];

    let recipes = recipes
        .into_iter()
        .map(|r| {
            let lexical = vocab.project(&r.ingredients).0;
            // Catalog embeddings use the same sorted, space-joined text the
            // encoder hands the provider at query time.
            let mut sorted = r.ingredients.clone();
            sorted.sort();
            let embedding = axis_embed(&sorted.join(" "));
            RecipeArtifact {
                recipe: r,
                lexical,
                embedding,
            }
        })
        .collect();

    CatalogArtifact {
        vocabulary,
        idf,
        embedding_dim: EMBED_DIM,
        recipes,
    }
}

pub fn engine_config() -> EngineConfig {
    EngineConfig::default()
}

pub fn build_engine(config: EngineConfig, embedder: Arc<dyn EmbeddingProvider>) -> RecipeEngine {
    let engine = RecipeEngine::new(config, embedder);
    load_fixture(&engine);
    engine
}

pub fn build_engine_with_clock(
    config: EngineConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    clock: Arc<ManualClock>,
) -> RecipeEngine {
    let engine = RecipeEngine::with_clock(config, embedder, clock);
    load_fixture(&engine);
    engine
}

pub fn load_fixture(engine: &RecipeEngine) {
    let artifact = artifact();
    let catalog = Catalog::from_artifact(&artifact).expect("catalog");
    let index = FlatIndex::build(artifact.embedding_entries()).expect("index");
    engine.load_catalog(catalog, Arc::new(index), Metric::CosineDistance);
}
