//! Concurrent multi-board search.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::browser::SessionFactory;
use crate::config::ScraperConfig;
use crate::extract::StructuredExtractor;
use crate::models::{ScrapedJobRecord, SearchError, SearchRequest};
use crate::scrapers::{SourceReport, SourceScraper};

/// Merged jobs plus the per-source reports they came from.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub jobs: Vec<ScrapedJobRecord>,
    pub reports: Vec<SourceReport>,
}

impl SearchResults {
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Runs the requested board scrapers concurrently and merges their output.
pub struct Aggregator {
    sessions: Arc<dyn SessionFactory>,
    extractor: StructuredExtractor,
    config: ScraperConfig,
}

impl Aggregator {
    pub fn new(
        sessions: Arc<dyn SessionFactory>,
        extractor: StructuredExtractor,
        config: ScraperConfig,
    ) -> Self {
        Self {
            sessions,
            extractor,
            config,
        }
    }

    /// Search every requested source.
    ///
    /// Sources run concurrently, each in its own browser session. One source
    /// failing never affects the others. Jobs are de-duplicated by URL, first
    /// occurrence in source order wins.
    pub async fn search_all(&self, request: &SearchRequest) -> Result<SearchResults, SearchError> {
        request.validate()?;

        let scrapers: Vec<SourceScraper> = request
            .ordered_sources()
            .into_iter()
            .map(|source| {
                SourceScraper::new(
                    source,
                    self.sessions.clone(),
                    self.extractor.clone(),
                    self.config.clone(),
                )
            })
            .collect();

        info!(
            "Searching {} source(s) for {:?}",
            scrapers.len(),
            request.keywords
        );
        let reports = join_all(scrapers.iter().map(|s| s.scrape(request))).await;

        let jobs = merge_jobs(request, &reports);

        if jobs.is_empty() {
            if let Some(report) = reports
                .iter()
                .find(|r| r.ai_exhausted && r.dom_links == 0)
            {
                let reason = report
                    .error
                    .clone()
                    .unwrap_or_else(|| "all models failed".to_string());
                warn!("No jobs found and AI extraction unavailable: {}", reason);
                return Err(SearchError::AiExhausted(reason));
            }
        }

        info!("Found {} unique jobs", jobs.len());
        Ok(SearchResults { jobs, reports })
    }
}

/// Concatenate report jobs in source order, keeping the first of each URL.
fn merge_jobs(request: &SearchRequest, reports: &[SourceReport]) -> Vec<ScrapedJobRecord> {
    let mut seen = HashSet::new();
    let mut jobs = Vec::new();

    for report in reports {
        if !request.includes(report.source) {
            continue;
        }
        if !report.is_complete() {
            warn!(
                "{}: stopped at {} ({})",
                report.source.display_name(),
                report.stage.as_str(),
                report.error.as_deref().unwrap_or("no error recorded")
            );
        } else if let Some(error) = &report.error {
            warn!("{}: {}", report.source.display_name(), error);
        }
        for job in &report.jobs {
            if seen.insert(job.url.clone()) {
                jobs.push(job.clone());
            }
        }
    }

    jobs
}
