//! Capability seams for the external collaborators the engine depends on
//! but does not implement: the embedding model and the approximate
//! nearest-neighbor index. Both are async because every call crossing this
//! boundary is timeout-guarded by the engine.

use async_trait::async_trait;

use crate::types::RecipeId;

/// Produces a dense vector for a normalized ingredient text.
///
/// Implementations may fail or hang; the engine wraps calls in a timeout and
/// surfaces failures as `EngineError::EmbeddingUnavailable`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Dimensionality of the vectors this provider emits.
    fn dim(&self) -> usize;

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// A neighbor returned by the index. `distance` is in the index's native
/// metric; the semantic scorer converts it to a similarity.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub recipe_id: RecipeId,
    pub distance: f32,
}

/// Approximate nearest-neighbor lookup over the catalog's dense vectors.
///
/// `query` returns up to `k` neighbors ordered best-first. The engine treats
/// recipes outside the returned set as semantic score 0; that recall gap is a
/// deliberate accuracy/performance trade-off tuned via the candidate pool
/// configuration.
#[async_trait]
pub trait AnnIndex: Send + Sync {
    async fn query(&self, vector: &[f32], k: usize) -> anyhow::Result<Vec<Neighbor>>;
}

#[async_trait]
impl<T: AnnIndex + ?Sized> AnnIndex for std::sync::Arc<T> {
    async fn query(&self, vector: &[f32], k: usize) -> anyhow::Result<Vec<Neighbor>> {
        (**self).query(vector, k).await
    }
}

#[async_trait]
impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for std::sync::Arc<T> {
    fn dim(&self) -> usize {
        (**self).dim()
    }

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        (**self).embed(text).await
    }
}

/// Injectable monotonic clock so cache TTL behavior is testable
/// deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> std::time::Instant;
}

/// Default clock backed by `Instant::now`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> std::time::Instant {
        std::time::Instant::now()
    }
}
