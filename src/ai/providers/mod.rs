//! Text-generation providers addressed by model identifier prefix.

mod anthropic;
mod gemini;
mod ollama;
mod openai;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use ollama::{OllamaProvider, OLLAMA_PREFIX};
pub use openai::OpenAiProvider;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use thiserror::Error;

/// Errors from a single provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0} is not set")]
    MissingApiKey(&'static str),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse provider response: {0}")]
    Parse(String),

    #[error("Provider returned no text")]
    EmptyResponse,

    #[error("{0}")]
    Other(String),
}

/// A text-in/text-out generation backend.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Short provider name for logging.
    fn name(&self) -> &str;

    /// Generate a completion for `prompt` with the given model identifier.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ProviderError>;
}

/// Generation parameters shared by the HTTP providers.
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

pub(crate) fn http_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Turn a non-2xx response into `ProviderError::Api`.
pub(crate) async fn ensure_success(resp: Response) -> Result<Response, ProviderError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(ProviderError::Api { status, body })
}

pub(crate) fn connection_error(e: reqwest::Error) -> ProviderError {
    ProviderError::Connection(e.to_string())
}

pub(crate) fn parse_error(e: reqwest::Error) -> ProviderError {
    ProviderError::Parse(e.to_string())
}

/// Reject blank completions so they count as failures for the fallback chain.
pub(crate) fn non_empty(text: String) -> Result<String, ProviderError> {
    if text.trim().is_empty() {
        Err(ProviderError::EmptyResponse)
    } else {
        Ok(text)
    }
}
