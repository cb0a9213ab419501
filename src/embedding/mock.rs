//! Deterministic mock embedding provider for tests.
//!
//! Hashes lowercase word tokens into vector dimensions, so texts sharing
//! vocabulary land close in cosine space and disjoint texts land far apart.
//! No I/O, fully deterministic, with a failure switch for exercising the
//! degraded retrieval paths.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use async_trait::async_trait;

use super::EmbeddingProvider;

pub struct MockEmbeddingProvider {
    dimensions: usize,
    fail: AtomicBool,
}

impl MockEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            fail: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail, simulating a dead embedding model.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimensions];
        for token in text.to_lowercase().split_whitespace() {
            let token: String = token.chars().filter(|c| c.is_alphanumeric()).collect();
            if token.is_empty() {
                continue;
            }
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            v[(hasher.finish() as usize) % self.dimensions] += 1.0;
        }

        // L2 normalize so cosine comparisons behave like a real model's output
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("mock embedding provider set to fail");
        }
        Ok(self.vectorize(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::cosine_similarity;

    #[tokio::test]
    async fn embeddings_are_deterministic() {
        let provider = MockEmbeddingProvider::new(64);
        let a = provider.embed("project apollo stack").await.unwrap();
        let b = provider.embed("project apollo stack").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn shared_vocabulary_lands_closer() {
        let provider = MockEmbeddingProvider::new(64);
        let apollo = provider.embed("apollo uses react and node").await.unwrap();
        let query = provider.embed("what stack does apollo use").await.unwrap();
        let noise = provider.embed("grandma's lasagna recipe").await.unwrap();

        assert!(cosine_similarity(&apollo, &query) > cosine_similarity(&apollo, &noise));
    }

    #[tokio::test]
    async fn failure_switch_propagates() {
        let provider = MockEmbeddingProvider::new(64);
        provider.set_fail(true);
        assert!(provider.embed("anything").await.is_err());
    }
}
