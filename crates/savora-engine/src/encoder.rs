//! Query Encoder: raw request -> normalized query + lexical and dense query
//! vectors.
//!
//! Normalization and fingerprinting live in `savora_core::query`; this
//! module adds the vector production around them. The dense side calls the
//! injected embedding provider under a timeout so a hung backend fails the
//! request instead of wedging it.

use std::time::Duration;

use savora_core::error::{EngineError, Result};
use savora_core::query::NormalizedQuery;
use savora_core::traits::EmbeddingProvider;
use savora_core::types::SparseVector;
use savora_lexical::Vocabulary;

pub struct QueryEncoder<P> {
    provider: P,
    timeout: Duration,
}

impl<P: EmbeddingProvider> QueryEncoder<P> {
    pub fn new(provider: P, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Project the normalized ingredient set through the offline vocabulary.
    /// Out-of-vocabulary ingredients contribute nothing; an all-unknown query
    /// yields the zero vector, which is valid and scores 0 lexically.
    #[must_use]
    pub fn lexical_vector(&self, vocabulary: &Vocabulary, query: &NormalizedQuery) -> SparseVector {
        vocabulary.project(&query.ingredients)
    }

    /// Embed the space-joined normalized ingredient text. Provider failure
    /// or timeout surfaces as `EmbeddingUnavailable`; the caller guarantees
    /// no cache entry is written on that path.
    pub async fn dense_vector(&self, query: &NormalizedQuery) -> Result<Vec<f32>> {
        let text = query.joined_text();
        match tokio::time::timeout(self.timeout, self.provider.embed(&text)).await {
            Ok(Ok(vector)) => {
                if vector.len() != self.provider.dim() {
                    return Err(EngineError::Internal(format!(
                        "provider returned dim {}, declared {}",
                        vector.len(),
                        self.provider.dim()
                    )));
                }
                Ok(vector)
            }
            Ok(Err(e)) => Err(EngineError::EmbeddingUnavailable(e.to_string())),
            Err(_) => Err(EngineError::EmbeddingUnavailable(format!(
                "embed timed out after {:?}",
                self.timeout
            ))),
        }
    }
}
