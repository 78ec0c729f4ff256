#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Embedding providers usable without the external model.
//!
//! The production embedder is an external collaborator injected behind
//! `savora_core::traits::EmbeddingProvider`. This crate carries a
//! deterministic feature-hashing stand-in for the CLI and for tests, plus a
//! counting wrapper tests use to observe how many pipeline executions
//! actually reached the provider.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use savora_core::traits::EmbeddingProvider;
use twox_hash::XxHash64;

/// Deterministic feature-hashing embedder: each whitespace token hashes to a
/// bucket, the vector is L2-normalized. Same text, same vector, every time,
/// with no model weights required.
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0f32; self.dim];
        for token in text.split_whitespace() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += 0.25 + val;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        Ok(v)
    }
}

/// Wraps a provider and counts how many `embed` calls went through.
/// This is how the single-flight tests observe pipeline executions.
pub struct CountingEmbedder<P> {
    inner: P,
    calls: Arc<AtomicUsize>,
}

impl<P> CountingEmbedder<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CountingEmbedder<P> {
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text).await
    }
}

/// A provider that always fails; tests use it to assert the engine surfaces
/// `EmbeddingUnavailable` and leaves no cache entry behind.
pub struct FailingEmbedder {
    dim: usize,
}

impl FailingEmbedder {
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        anyhow::bail!("embedding backend offline")
    }
}
