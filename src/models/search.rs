//! Search request model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::JobSource;

/// Default number of records requested per source.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Errors surfaced to the caller of a search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid search request: {0}")]
    InvalidRequest(String),

    /// The model fallback chain was exhausted and no source had markup links to fall back on.
    #[error("AI extraction unavailable for every source and no page links to fall back on: {0}")]
    AiExhausted(String),
}

/// A job search across one or more boards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub keywords: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default = "default_sources")]
    pub sources: Vec<JobSource>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_sources() -> Vec<JobSource> {
    JobSource::ALL.to_vec()
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

impl SearchRequest {
    /// Create a request for all sources with default limits.
    pub fn new(keywords: impl Into<String>) -> Result<Self, SearchError> {
        let request = Self {
            keywords: keywords.into().trim().to_string(),
            location: None,
            sources: default_sources(),
            max_results: DEFAULT_MAX_RESULTS,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        let location = location.into().trim().to_string();
        self.location = if location.is_empty() {
            None
        } else {
            Some(location)
        };
        self
    }

    /// Restrict the search to the given sources (duplicates are dropped).
    pub fn with_sources(mut self, sources: impl IntoIterator<Item = JobSource>) -> Self {
        let mut selected: Vec<JobSource> = Vec::new();
        for source in sources {
            if !selected.contains(&source) {
                selected.push(source);
            }
        }
        self.sources = selected;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Check the invariants a request must hold before any scraping starts.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.keywords.trim().is_empty() {
            return Err(SearchError::InvalidRequest(
                "keywords are required".to_string(),
            ));
        }
        if self.max_results == 0 {
            return Err(SearchError::InvalidRequest(
                "max_results must be at least 1".to_string(),
            ));
        }
        if self.sources.is_empty() {
            return Err(SearchError::InvalidRequest(
                "at least one source must be selected".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `source` was requested.
    pub fn includes(&self, source: JobSource) -> bool {
        self.sources.contains(&source)
    }

    /// Requested sources in canonical iteration order.
    pub fn ordered_sources(&self) -> Vec<JobSource> {
        JobSource::ALL
            .into_iter()
            .filter(|s| self.includes(*s))
            .collect()
    }
}
