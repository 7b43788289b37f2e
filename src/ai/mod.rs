//! AI gateway: the single entry point for text-generation calls.
//!
//! Models are addressed by identifier; the identifier's prefix selects the
//! provider (`claude-`, `gemini-`, `gpt-`, `ollama:` ...). A failed primary
//! call walks the configured fallback list exactly once.

mod config;
pub mod providers;

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

pub use config::{parse_model_list, AiConfig};
pub use providers::{GenerationParams, ProviderError, TextProvider};

use providers::{AnthropicProvider, GeminiProvider, OllamaProvider, OpenAiProvider, OLLAMA_PREFIX};

/// Errors returned by the AI gateway.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI features are disabled")]
    Disabled,

    #[error("Unsupported model '{0}': no provider registered for its prefix")]
    UnsupportedModel(String),

    #[error("Model '{model}' failed: {source}")]
    Provider {
        model: String,
        #[source]
        source: ProviderError,
    },
}

impl AiError {
    /// Whether the error came from a provider (as opposed to gating or routing).
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, AiError::Provider { .. })
    }
}

struct ProviderRoute {
    prefix: String,
    provider: Arc<dyn TextProvider>,
}

/// Routes prompts to providers and applies the model fallback chain.
pub struct AiGateway {
    config: AiConfig,
    routes: Vec<ProviderRoute>,
}

impl AiGateway {
    /// Create a gateway with the built-in HTTP providers.
    pub fn new(config: AiConfig) -> Self {
        let params = GenerationParams {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        };
        let timeout = config.request_timeout;

        let anthropic: Arc<dyn TextProvider> = Arc::new(AnthropicProvider::new(
            config.anthropic_api_key.clone(),
            params,
            timeout,
        ));
        let gemini: Arc<dyn TextProvider> = Arc::new(GeminiProvider::new(
            config.gemini_api_key.clone(),
            params,
            timeout,
        ));
        let openai: Arc<dyn TextProvider> = Arc::new(OpenAiProvider::new(
            &config.openai_base_url,
            config.openai_api_key.clone(),
            params,
            timeout,
        ));
        let ollama: Arc<dyn TextProvider> = Arc::new(OllamaProvider::new(
            &config.ollama_endpoint,
            params,
            timeout,
        ));

        let mut gateway = Self::without_providers(config);
        gateway.register("claude-", anthropic);
        gateway.register("gemini-", gemini);
        for prefix in ["gpt-", "o1", "o3", "o4"] {
            gateway.register(prefix, Arc::clone(&openai));
        }
        gateway.register(OLLAMA_PREFIX, ollama);
        gateway
    }

    /// Create a gateway with no providers registered.
    pub fn without_providers(config: AiConfig) -> Self {
        Self {
            config,
            routes: Vec::new(),
        }
    }

    /// Register a provider for model identifiers starting with `prefix`.
    pub fn with_provider(mut self, prefix: &str, provider: Arc<dyn TextProvider>) -> Self {
        self.register(prefix, provider);
        self
    }

    fn register(&mut self, prefix: &str, provider: Arc<dyn TextProvider>) {
        self.routes.retain(|r| r.prefix != prefix);
        self.routes.push(ProviderRoute {
            prefix: prefix.to_string(),
            provider,
        });
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Find the provider for a model identifier (longest matching prefix wins).
    pub fn resolve(&self, model: &str) -> Option<&Arc<dyn TextProvider>> {
        self.routes
            .iter()
            .filter(|r| model.starts_with(&r.prefix))
            .max_by_key(|r| r.prefix.len())
            .map(|r| &r.provider)
    }

    /// Call a model, falling back through the configured list on failure.
    pub async fn complete(&self, prompt: &str, model: &str) -> Result<String, AiError> {
        self.call_ai(prompt, model, false).await
    }

    /// Call `model`. Unless `is_fallback` is set, a failure walks the fallback
    /// list once, skipping models already tried; if all of them fail the
    /// original error is returned.
    pub async fn call_ai(
        &self,
        prompt: &str,
        model: &str,
        is_fallback: bool,
    ) -> Result<String, AiError> {
        if !self.config.enabled {
            return Err(AiError::Disabled);
        }

        let original = match self.attempt(prompt, model).await {
            Ok(text) => return Ok(text),
            Err(e) => e,
        };

        if is_fallback {
            return Err(original);
        }

        let mut tried: HashSet<&str> = HashSet::new();
        tried.insert(model);

        for fallback in &self.config.fallback_models {
            if !tried.insert(fallback.as_str()) {
                continue;
            }
            info!("Falling back from {} to {}", model, fallback);
            match self.attempt(prompt, fallback).await {
                Ok(text) => return Ok(text),
                Err(e) => warn!("Fallback model {} failed: {}", fallback, e),
            }
        }

        warn!("All fallback models failed for {}", model);
        Err(original)
    }

    /// Single call to one model with no fallback.
    async fn attempt(&self, prompt: &str, model: &str) -> Result<String, AiError> {
        let provider = self
            .resolve(model)
            .ok_or_else(|| AiError::UnsupportedModel(model.to_string()))?;

        debug!(
            "Calling {} via {} ({} prompt chars)",
            model,
            provider.name(),
            prompt.len()
        );

        match provider.generate(model, prompt).await {
            Ok(text) => {
                info!("AI call succeeded: model={} chars={}", model, text.len());
                Ok(text)
            }
            Err(source) => {
                warn!("AI call failed: model={} error={}", model, source);
                Err(AiError::Provider {
                    model: model.to_string(),
                    source,
                })
            }
        }
    }
}
