//! AI gateway configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the AI gateway and its providers.
///
/// Connection secrets come from the environment and are never written back
/// out when the config is serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    /// Feature flag for every AI call. When false the gateway refuses all calls.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Model used for job listing extraction.
    #[serde(default = "default_model")]
    pub model: String,
    /// Ordered models tried once each when a primary call fails.
    #[serde(default = "default_fallback_models")]
    pub fallback_models: Vec<String>,
    /// Maximum tokens in a response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for generation (0.0 - 1.0).
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    /// Base URL for OpenAI-compatible providers (OpenAI, Groq, Together.ai).
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    /// Ollama API endpoint.
    #[serde(default = "default_ollama_endpoint")]
    pub ollama_endpoint: String,
    #[serde(default, skip_serializing)]
    pub anthropic_api_key: Option<String>,
    #[serde(default, skip_serializing)]
    pub gemini_api_key: Option<String>,
    #[serde(default, skip_serializing)]
    pub openai_api_key: Option<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_fallback_models() -> Vec<String> {
    vec!["claude-haiku-4-5".to_string(), "gpt-4o-mini".to_string()]
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.2
}

fn default_request_timeout() -> u64 {
    120
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

impl Default for AiConfig {
    fn default() -> Self {
        Self::base_default().with_env_overrides()
    }
}

impl AiConfig {
    /// Defaults without reading the environment.
    pub fn base_default() -> Self {
        Self {
            enabled: default_enabled(),
            model: default_model(),
            fallback_models: default_fallback_models(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            request_timeout: default_request_timeout(),
            openai_base_url: default_openai_base_url(),
            ollama_endpoint: default_ollama_endpoint(),
            anthropic_api_key: None,
            gemini_api_key: None,
            openai_api_key: None,
        }
    }

    /// Check if the config equals the default (for skip_serializing_if).
    pub fn is_default(&self) -> bool {
        let mut base = Self::base_default();
        base.anthropic_api_key = self.anthropic_api_key.clone();
        base.gemini_api_key = self.gemini_api_key.clone();
        base.openai_api_key = self.openai_api_key.clone();
        *self == base
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `AI_ENABLED` or `ENABLE_AI_FEATURES`: "true"/"1" or "false"/"0"
    /// - `AI_MODEL`: extraction model
    /// - `AI_FALLBACK_MODELS`: comma-separated fallback models
    /// - `ANTHROPIC_API_KEY`, `GEMINI_API_KEY` (or `GOOGLE_API_KEY`), `OPENAI_API_KEY`
    /// - `OPENAI_BASE_URL`: OpenAI-compatible endpoint
    /// - `OLLAMA_ENDPOINT`: Ollama endpoint
    pub fn with_env_overrides(mut self) -> Self {
        let flag = std::env::var("AI_ENABLED")
            .or_else(|_| std::env::var("ENABLE_AI_FEATURES"))
            .ok();
        if let Some(val) = flag {
            self.enabled = val.eq_ignore_ascii_case("true") || val == "1";
        }

        if let Ok(val) = std::env::var("AI_MODEL") {
            if !val.trim().is_empty() {
                self.model = val.trim().to_string();
            }
        }

        if let Ok(val) = std::env::var("AI_FALLBACK_MODELS") {
            self.fallback_models = parse_model_list(&val);
        }

        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            self.anthropic_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY").or_else(|_| std::env::var("GOOGLE_API_KEY"))
        {
            self.gemini_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Ok(val) = std::env::var("OPENAI_BASE_URL") {
            self.openai_base_url = val.trim_end_matches('/').to_string();
        }
        if let Ok(val) = std::env::var("OLLAMA_ENDPOINT") {
            self.ollama_endpoint = val.trim_end_matches('/').to_string();
        }

        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_fallbacks<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_models = models.into_iter().map(Into::into).collect();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Split a comma-separated model list, dropping blanks.
pub fn parse_model_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect()
}
