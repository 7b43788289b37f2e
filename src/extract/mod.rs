//! Structured extraction: prompt a model, then recover typed data from its text.

pub mod json;
mod prompts;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ai::{AiError, AiGateway};
use crate::models::{AiJobListing, JobPosting, JobSource};

pub use json::{parse_model_json, recover_json_value, ExtractionParseError};
pub use prompts::{job_posting_prompt, listings_prompt, truncate_chars, MAX_PAGE_CHARS};

/// Keys a model sometimes wraps a listings array under.
const WRAPPER_KEYS: [&str; 3] = ["jobs", "listings", "results"];

/// Errors from a structured extraction call.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Ai(#[from] AiError),

    #[error(transparent)]
    Parse(#[from] ExtractionParseError),
}

impl ExtractError {
    /// The model chain failed outright (every model errored or none resolved).
    ///
    /// A disabled gateway is not exhaustion: callers are expected to fall back
    /// to markup-only results in that case.
    pub fn is_ai_exhausted(&self) -> bool {
        matches!(
            self,
            ExtractError::Ai(AiError::Provider { .. } | AiError::UnsupportedModel(_))
        )
    }
}

/// Outcome of a listings extraction. Failures are recovered here: `listings`
/// is empty and `failure` records why.
#[derive(Debug, Default)]
pub struct ListingExtraction {
    pub listings: Vec<AiJobListing>,
    pub failure: Option<ExtractError>,
}

impl ListingExtraction {
    pub fn ai_exhausted(&self) -> bool {
        self.failure
            .as_ref()
            .map(ExtractError::is_ai_exhausted)
            .unwrap_or(false)
    }
}

/// Calls the AI gateway and defensively parses the reply.
#[derive(Clone)]
pub struct StructuredExtractor {
    gateway: Arc<AiGateway>,
}

impl StructuredExtractor {
    pub fn new(gateway: Arc<AiGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &AiGateway {
        &self.gateway
    }

    /// Model used when the caller does not name one.
    pub fn default_model(&self) -> &str {
        &self.gateway.config().model
    }

    /// Prompt `model` and parse its reply as `T`.
    pub async fn extract<T: DeserializeOwned>(
        &self,
        prompt: &str,
        model: &str,
    ) -> Result<T, ExtractError> {
        let text = self.gateway.complete(prompt, model).await?;
        debug!("Model {} returned {} chars", model, text.len());
        Ok(parse_model_json(&text)?)
    }

    /// Extract up to `max_results` listings from a search results page.
    pub async fn extract_listings(
        &self,
        source: JobSource,
        page_text: &str,
        max_results: usize,
        model: &str,
    ) -> ListingExtraction {
        let prompt = listings_prompt(source.display_name(), page_text, max_results);

        match self.extract::<Value>(&prompt, model).await {
            Ok(value) => {
                let mut listings = listings_from_value(value);
                listings.truncate(max_results);
                info!(
                    "{}: model extracted {} listings",
                    source.display_name(),
                    listings.len()
                );
                ListingExtraction {
                    listings,
                    failure: None,
                }
            }
            Err(e) => {
                warn!("{}: listing extraction failed: {}", source.display_name(), e);
                ListingExtraction {
                    listings: Vec::new(),
                    failure: Some(e),
                }
            }
        }
    }
}

/// Pull listings out of a recovered JSON value.
///
/// Accepts a bare array, an object wrapping the array under a known key, or
/// a single listing object. Elements that fail to deserialize or carry
/// neither a title nor a company are skipped.
pub fn listings_from_value(value: Value) -> Vec<AiJobListing> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let wrapped = WRAPPER_KEYS
                .iter()
                .find(|key| map.get(**key).map(Value::is_array).unwrap_or(false))
                .and_then(|key| map.remove(*key));
            match wrapped {
                Some(Value::Array(items)) => items,
                _ => vec![Value::Object(map)],
            }
        }
        _ => Vec::new(),
    };

    let total = items.len();
    let listings: Vec<AiJobListing> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<AiJobListing>(item).ok())
        .filter(AiJobListing::is_usable)
        .collect();

    if listings.len() < total {
        debug!("Skipped {} unusable listing entries", total - listings.len());
    }
    listings
}

/// Parse a full job posting page into a `JobPosting`.
pub async fn parse_job_posting(
    extractor: &StructuredExtractor,
    page_text: &str,
    url: &str,
    model: &str,
) -> Result<JobPosting, ExtractError> {
    let prompt = job_posting_prompt(page_text, url);
    let mut posting: JobPosting = extractor.extract(&prompt, model).await?;

    posting.job_title = posting.job_title.trim().to_string();
    posting.company = posting.company.trim().to_string();
    posting.job_description = posting.job_description.trim().to_string();
    posting.location = posting
        .location
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    posting.salary = posting
        .salary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    if posting.job_title.is_empty() && posting.job_description.is_empty() {
        return Err(ExtractError::Parse(ExtractionParseError::new(
            "response has neither a job title nor a description",
            &serde_json::to_string(&posting).unwrap_or_default(),
        )));
    }

    Ok(posting)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiConfig, ProviderError, TextProvider};
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedProvider(&'static str);

    #[async_trait]
    impl TextProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, _model: &str, _prompt: &str) -> Result<String, ProviderError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl TextProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn generate(&self, _model: &str, _prompt: &str) -> Result<String, ProviderError> {
            Err(ProviderError::Connection("refused".to_string()))
        }
    }

    fn extractor_with(provider: Arc<dyn TextProvider>, config: AiConfig) -> StructuredExtractor {
        let gateway = AiGateway::without_providers(config.with_fallbacks(Vec::<String>::new()))
            .with_provider("mock-", provider);
        StructuredExtractor::new(Arc::new(gateway))
    }

    #[test]
    fn test_listings_from_array_skips_bad_elements() {
        let value = json!([
            {"title": "Rust Engineer", "company": "Acme"},
            "not an object",
            {"title": 42},
            {"title": "  ", "company": ""},
            {"company": "Globex"}
        ]);
        let listings = listings_from_value(value);
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].title(), Some("Rust Engineer"));
        assert_eq!(listings[1].company(), Some("Globex"));
    }

    #[test]
    fn test_listings_from_wrapped_object() {
        let value = json!({"results": [{"title": "A"}, {"title": "B"}]});
        assert_eq!(listings_from_value(value).len(), 2);

        let value = json!({"jobs": [{"title": "A"}]});
        assert_eq!(listings_from_value(value).len(), 1);
    }

    #[test]
    fn test_listings_from_single_object() {
        let value = json!({"title": "Solo", "remote": "yes"});
        let listings = listings_from_value(value);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].remote, Some(true));
    }

    #[test]
    fn test_listings_keep_numeric_text_fields() {
        let value = json!([
            {"title": "Rust Engineer", "company": "Acme", "salary": 120000},
            {"title": "Go Engineer", "company": "Globex", "salary": "$100k"},
            {"title": "Data Engineer", "location": 2000, "workType": ["contract"]}
        ]);
        let listings = listings_from_value(value);
        assert_eq!(listings.len(), 3);
        assert_eq!(listings[0].salary.as_deref(), Some("120000"));
        assert_eq!(listings[1].salary.as_deref(), Some("$100k"));
        assert_eq!(listings[2].location.as_deref(), Some("2000"));
        assert_eq!(listings[2].work_type, None);
    }

    #[test]
    fn test_listings_from_scalar_is_empty() {
        assert!(listings_from_value(json!("nothing")).is_empty());
        assert!(listings_from_value(json!(null)).is_empty());
    }

    #[tokio::test]
    async fn test_extract_listings_respects_limit() {
        let provider = Arc::new(FixedProvider(
            "```json\n[{\"title\": \"A\"}, {\"title\": \"B\"}, {\"title\": \"C\"},]\n```",
        ));
        let extractor = extractor_with(provider, AiConfig::base_default());
        let outcome = extractor
            .extract_listings(JobSource::Seek, "page", 2, "mock-1")
            .await;
        assert!(outcome.failure.is_none());
        assert_eq!(outcome.listings.len(), 2);
    }

    #[tokio::test]
    async fn test_extract_listings_recovers_parse_failure() {
        let provider = Arc::new(FixedProvider("Sorry, I can't help with that."));
        let extractor = extractor_with(provider, AiConfig::base_default());
        let outcome = extractor
            .extract_listings(JobSource::Indeed, "page", 10, "mock-1")
            .await;
        assert!(outcome.listings.is_empty());
        assert!(matches!(outcome.failure, Some(ExtractError::Parse(_))));
        assert!(!outcome.ai_exhausted());
    }

    #[tokio::test]
    async fn test_extract_listings_reports_exhaustion() {
        let extractor = extractor_with(Arc::new(FailingProvider), AiConfig::base_default());
        let outcome = extractor
            .extract_listings(JobSource::LinkedIn, "page", 10, "mock-1")
            .await;
        assert!(outcome.listings.is_empty());
        assert!(outcome.ai_exhausted());
    }

    #[tokio::test]
    async fn test_disabled_is_not_exhaustion() {
        let extractor = extractor_with(
            Arc::new(FixedProvider("[]")),
            AiConfig::base_default().disabled(),
        );
        let outcome = extractor
            .extract_listings(JobSource::Seek, "page", 10, "mock-1")
            .await;
        assert!(matches!(
            outcome.failure,
            Some(ExtractError::Ai(AiError::Disabled))
        ));
        assert!(!outcome.ai_exhausted());
    }

    #[tokio::test]
    async fn test_parse_job_posting() {
        let provider = Arc::new(FixedProvider(
            r#"{"jobTitle": " Senior Rust Engineer ", "company": "Acme", "location": "", "jobDescription": "Build things."}"#,
        ));
        let extractor = extractor_with(provider, AiConfig::base_default());
        let posting = parse_job_posting(&extractor, "text", "https://example.com/job/1", "mock-1")
            .await
            .unwrap();
        assert_eq!(posting.job_title, "Senior Rust Engineer");
        assert_eq!(posting.location, None);
        assert_eq!(posting.job_description, "Build things.");
    }

    #[tokio::test]
    async fn test_parse_job_posting_rejects_empty() {
        let provider = Arc::new(FixedProvider(r#"{"company": "Acme"}"#));
        let extractor = extractor_with(provider, AiConfig::base_default());
        let err = parse_job_posting(&extractor, "text", "https://example.com", "mock-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Parse(_)));
    }
}
