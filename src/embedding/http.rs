//! OpenAI-compatible HTTP embedding provider.
//!
//! Talks to a `POST {base_url}/embeddings` endpoint. Works against OpenAI,
//! Ollama, and any compatible gateway. Requests carry the configured timeout;
//! a timeout or error surfaces as a normal `Err` which callers treat as a
//! soft failure for the vector source.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::EmbeddingProvider;
use crate::config::EmbeddingConfig;

pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

impl HttpEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build embedding HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: std::env::var(&config.api_key_env).ok(),
            dimensions: config.dimensions,
        })
    }

    async fn request(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);
        let mut request = self.client.post(&url).json(&serde_json::json!({
            "model": self.model,
            "input": inputs,
        }));
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("embedding request failed for {url}"))?;

        anyhow::ensure!(
            response.status().is_success(),
            "embedding endpoint returned HTTP {}",
            response.status()
        );

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .context("failed to parse embeddings response")?;

        anyhow::ensure!(
            parsed.data.len() == inputs.len(),
            "embedding endpoint returned {} vectors for {} inputs",
            parsed.data.len(),
            inputs.len()
        );

        for item in &parsed.data {
            anyhow::ensure!(
                item.embedding.len() == self.dimensions,
                "embedding endpoint returned {}-dim vector, expected {}",
                item.embedding.len(),
                self.dimensions
            );
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request(&[text.to_string()]).await?;
        Ok(vectors.pop().expect("response length already checked"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
