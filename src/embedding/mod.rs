//! Text-to-vector embedding seam.
//!
//! Provides the [`EmbeddingProvider`] trait, an OpenAI-compatible HTTP
//! implementation, and a deterministic token-hash mock for tests. Providers
//! are created via [`create_provider`] from configuration.
//!
//! Any model producing fixed-length dense vectors works; the only
//! requirement is consistency within one index.

pub mod http;
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;

/// Trait for embedding text into fixed-length dense vectors.
///
/// Implementations must produce vectors of exactly `dimensions()` length and
/// be consistent across calls — the per-user index relies on it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of text strings. Implementations may override for
    /// batched inference.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Number of dimensions this provider produces.
    fn dimensions(&self) -> usize;
}

/// Create an embedding provider from config.
///
/// `"http"` talks to an OpenAI-compatible `/embeddings` endpoint (a local
/// Ollama works out of the box); `"mock"` is deterministic and offline.
pub fn create_provider(
    config: &crate::config::EmbeddingConfig,
) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "http" => Ok(Box::new(http::HttpEmbeddingProvider::new(config)?)),
        "mock" => Ok(Box::new(mock::MockEmbeddingProvider::new(config.dimensions))),
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: http, mock"),
    }
}
