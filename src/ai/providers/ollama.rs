//! Local Ollama provider.
//!
//! Model identifiers carry an `ollama:` prefix which is stripped before the
//! request, e.g. `ollama:llama3.1:8b`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    connection_error, ensure_success, http_client, non_empty, parse_error, GenerationParams,
    ProviderError, TextProvider,
};

pub const OLLAMA_PREFIX: &str = "ollama:";

pub struct OllamaProvider {
    endpoint: String,
    params: GenerationParams,
    client: Client,
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaProvider {
    pub fn new(endpoint: &str, params: GenerationParams, timeout_secs: u64) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            params,
            client: http_client(timeout_secs),
        }
    }
}

#[async_trait]
impl TextProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        let model = model.strip_prefix(OLLAMA_PREFIX).unwrap_or(model);
        let request = OllamaRequest {
            model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.params.temperature,
                num_predict: self.params.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.endpoint);
        debug!("Ollama request: model={}", model);

        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(connection_error)?;
        let body: OllamaResponse = ensure_success(resp).await?.json().await.map_err(parse_error)?;

        non_empty(body.response)
    }
}
