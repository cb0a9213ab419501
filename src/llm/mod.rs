//! Chat-completion seam.
//!
//! The reply model and the intent classifier both go through
//! [`TextGenerator`]: one system prompt, one user prompt, a temperature.
//! The backend is untrusted, possibly slow, possibly failing — callers
//! always have a fallback path.

pub mod http;
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one chat completion and return the reply text.
    async fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<String>;
}

/// Create the OpenAI-compatible chat-completions client from config.
pub fn create_generator(config: &crate::config::LlmConfig) -> Result<Box<dyn TextGenerator>> {
    Ok(Box::new(http::HttpTextGenerator::new(config)?))
}
