//! Job board scrapers.
//!
//! Each board implements `JobBoard` (URL grammar, selectors, pacing, match
//! policy). `SourceScraper` drives one board through a single browser
//! session: navigate, wait, scroll, read, extract, reconcile. It never
//! fails; whatever it managed to assemble is returned in a `SourceReport`.

mod indeed;
pub mod links;
mod linkedin;
pub mod reconcile;
mod seek;

pub use indeed::Indeed;
pub use linkedin::LinkedIn;
pub use reconcile::{build_records, MatchPolicy, RecordContext};
pub use seek::Seek;

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::browser::{
    human_pause, simulate_scroll, BrowserSession, LaunchError, ScrollPolicy, SessionError,
    SessionFactory,
};
use crate::config::ScraperConfig;
use crate::extract::{ListingExtraction, StructuredExtractor};
use crate::models::{DomLink, JobSource, ScrapedJobRecord, SearchRequest};

/// Random milliseconds added to every pacing pause.
const PAUSE_JITTER_MS: u64 = 1000;

/// Errors that end a scrape early.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Invalid URL {0}")]
    InvalidUrl(String),
}

/// Base pauses, in milliseconds, around a board's search page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub pre_navigation_ms: u64,
    pub post_navigation_ms: u64,
    pub final_settle_ms: u64,
}

/// What differs between job boards.
pub trait JobBoard: Send + Sync {
    fn source(&self) -> JobSource;

    /// Scheme and host links are resolved against.
    fn origin(&self) -> &'static str;

    fn search_url(&self, request: &SearchRequest) -> String;

    /// Selector that appears once results have rendered.
    fn results_selector(&self) -> &'static str;

    fn pacing(&self) -> Pacing;

    fn match_policy(&self) -> MatchPolicy;

    /// Location used when neither the model nor the request gives one.
    fn default_location(&self) -> &'static str;

    /// Job links from the results page markup, in document order.
    fn extract_links(&self, html: &str, limit: usize) -> Vec<DomLink>;
}

/// Board implementation for a source.
pub fn board_for(source: JobSource) -> Box<dyn JobBoard> {
    match source {
        JobSource::Seek => Box::new(Seek),
        JobSource::LinkedIn => Box::new(LinkedIn),
        JobSource::Indeed => Box::new(Indeed),
    }
}

/// How far a scrape progressed.
///
/// There is no terminal `Closed` stage: session teardown runs after every
/// stage and is reported separately by `SourceReport::session_released`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeStage {
    Idle,
    SessionOpen,
    Navigated,
    ContentAcquired,
    Reconciled,
}

impl ScrapeStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeStage::Idle => "idle",
            ScrapeStage::SessionOpen => "session_open",
            ScrapeStage::Navigated => "navigated",
            ScrapeStage::ContentAcquired => "content_acquired",
            ScrapeStage::Reconciled => "reconciled",
        }
    }
}

/// Outcome of scraping one source.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReport {
    pub source: JobSource,
    pub jobs: Vec<ScrapedJobRecord>,
    /// Links found in the results markup.
    pub dom_links: usize,
    pub stage: ScrapeStage,
    /// Whether the browser session was closed.
    pub session_released: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The model fallback chain failed for this page.
    pub ai_exhausted: bool,
}

impl SourceReport {
    pub fn new(source: JobSource) -> Self {
        Self {
            source,
            jobs: Vec::new(),
            dom_links: 0,
            stage: ScrapeStage::Idle,
            session_released: false,
            error: None,
            ai_exhausted: false,
        }
    }

    /// Whether the scrape reached reconciliation and released its session.
    pub fn is_complete(&self) -> bool {
        self.stage == ScrapeStage::Reconciled && self.session_released
    }
}

/// Scrapes one job board.
pub struct SourceScraper {
    board: Box<dyn JobBoard>,
    sessions: Arc<dyn SessionFactory>,
    extractor: StructuredExtractor,
    config: ScraperConfig,
}

impl SourceScraper {
    pub fn new(
        source: JobSource,
        sessions: Arc<dyn SessionFactory>,
        extractor: StructuredExtractor,
        config: ScraperConfig,
    ) -> Self {
        Self::with_board(board_for(source), sessions, extractor, config)
    }

    pub fn with_board(
        board: Box<dyn JobBoard>,
        sessions: Arc<dyn SessionFactory>,
        extractor: StructuredExtractor,
        config: ScraperConfig,
    ) -> Self {
        Self {
            board,
            sessions,
            extractor,
            config,
        }
    }

    pub fn source(&self) -> JobSource {
        self.board.source()
    }

    /// Scrape the board for `request`. Never fails; errors are logged and
    /// recorded on the report, and the session is always released.
    pub async fn scrape(&self, request: &SearchRequest) -> SourceReport {
        let name = self.source().display_name();
        let mut report = SourceReport::new(self.source());

        let mut session = match self.sessions.create_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!("{}: could not open browser session: {}", name, e);
                report.error = Some(ScrapeError::from(e).to_string());
                return report;
            }
        };
        report.stage = ScrapeStage::SessionOpen;

        if let Err(e) = self.run(session.as_mut(), request, &mut report).await {
            warn!(
                "{}: scrape stopped at {}: {}",
                name,
                report.stage.as_str(),
                e
            );
            report.error = Some(e.to_string());
        }

        session.close().await;
        report.session_released = true;

        info!(
            "{}: {} jobs ({} page links, stage {})",
            name,
            report.jobs.len(),
            report.dom_links,
            report.stage.as_str()
        );
        report
    }

    async fn run(
        &self,
        session: &mut dyn BrowserSession,
        request: &SearchRequest,
        report: &mut SourceReport,
    ) -> Result<(), ScrapeError> {
        let name = self.source().display_name();
        let pacing = self.board.pacing();
        let url = self.board.search_url(request);

        self.pause(pacing.pre_navigation_ms).await;
        info!("Scraping {}: {}", name, url);
        session
            .navigate(&url, self.config.navigation_timeout())
            .await?;
        report.stage = ScrapeStage::Navigated;

        self.pause(pacing.post_navigation_ms).await;

        if let Err(e) = session
            .wait_for_selector(self.board.results_selector(), self.config.results_timeout())
            .await
        {
            warn!("{}: results marker not found, continuing: {}", name, e);
        }

        let scroll = if self.config.human_delays {
            ScrollPolicy::default()
        } else {
            ScrollPolicy::without_pauses()
        };
        simulate_scroll(session, &scroll).await;

        self.pause(pacing.final_settle_ms).await;

        let text = match session.visible_text().await {
            Ok(text) => text,
            Err(e) => {
                warn!("{}: could not read page text: {}", name, e);
                String::new()
            }
        };
        let links = match session.html().await {
            Ok(html) => self.board.extract_links(&html, self.config.max_dom_links),
            Err(e) => {
                warn!("{}: could not read page markup: {}", name, e);
                Vec::new()
            }
        };
        debug!(
            "{}: {} chars of text, {} links",
            name,
            text.len(),
            links.len()
        );
        report.dom_links = links.len();
        report.stage = ScrapeStage::ContentAcquired;

        let extraction = if text.trim().is_empty() {
            ListingExtraction::default()
        } else {
            self.extractor
                .extract_listings(
                    self.source(),
                    &text,
                    request.max_results,
                    self.extractor.default_model(),
                )
                .await
        };
        report.ai_exhausted = extraction.ai_exhausted();
        if let Some(failure) = &extraction.failure {
            report.error = Some(failure.to_string());
        }

        let ctx = RecordContext {
            source: self.source(),
            policy: self.board.match_policy(),
            search_url: &url,
            requested_location: request.location.as_deref(),
            default_location: self.board.default_location(),
            max_results: request.max_results,
            scraped_at: Utc::now(),
        };
        report.jobs = build_records(&ctx, &extraction.listings, &links);
        report.stage = ScrapeStage::Reconciled;

        Ok(())
    }

    async fn pause(&self, base_ms: u64) {
        if self.config.human_delays && base_ms > 0 {
            human_pause(base_ms, PAUSE_JITTER_MS).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiConfig, AiGateway, ProviderError, TextProvider};
    use crate::models::MatchConfidence;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    const SEEK_HTML: &str = r#"
        <article data-testid="job-card"><a data-automation="jobTitle" href="/job/1">Senior Rust Engineer</a></article>
        <article data-testid="job-card"><a data-automation="jobTitle" href="/job/2">Platform Engineer</a></article>
    "#;

    #[derive(Default)]
    struct Calls {
        navigated: Vec<String>,
        closed: usize,
    }

    struct FakePage {
        calls: Arc<Mutex<Calls>>,
        fail_navigation: bool,
        marker_times_out: bool,
    }

    #[async_trait]
    impl BrowserSession for FakePage {
        async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), SessionError> {
            self.calls.lock().unwrap().navigated.push(url.to_string());
            if self.fail_navigation {
                return Err(SessionError::Timeout {
                    what: format!("navigation to {}", url),
                    after: timeout,
                });
            }
            Ok(())
        }

        async fn wait_for_selector(
            &mut self,
            selector: &str,
            timeout: Duration,
        ) -> Result<(), SessionError> {
            if self.marker_times_out {
                return Err(SessionError::Timeout {
                    what: selector.to_string(),
                    after: timeout,
                });
            }
            Ok(())
        }

        async fn scroll_height(&mut self) -> Result<u64, SessionError> {
            Ok(800)
        }

        async fn scroll_by(&mut self, _pixels: u64) -> Result<(), SessionError> {
            Ok(())
        }

        async fn visible_text(&mut self) -> Result<String, SessionError> {
            Ok("Senior Rust Engineer at Acme, Sydney".to_string())
        }

        async fn html(&mut self) -> Result<String, SessionError> {
            Ok(SEEK_HTML.to_string())
        }

        async fn close(&mut self) {
            self.calls.lock().unwrap().closed += 1;
        }
    }

    struct FakeFactory {
        calls: Arc<Mutex<Calls>>,
        fail_navigation: bool,
        marker_times_out: bool,
        launches: AtomicUsize,
    }

    impl FakeFactory {
        fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Calls::default())),
                fail_navigation: false,
                marker_times_out: false,
                launches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SessionFactory for FakeFactory {
        async fn create_session(&self) -> Result<Box<dyn BrowserSession>, LaunchError> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakePage {
                calls: self.calls.clone(),
                fail_navigation: self.fail_navigation,
                marker_times_out: self.marker_times_out,
            }))
        }
    }

    struct Reply(&'static str);

    #[async_trait]
    impl TextProvider for Reply {
        fn name(&self) -> &str {
            "reply"
        }

        async fn generate(&self, _model: &str, _prompt: &str) -> Result<String, ProviderError> {
            Ok(self.0.to_string())
        }
    }

    fn extractor(reply: &'static str) -> StructuredExtractor {
        let config = AiConfig::base_default()
            .with_model("mock-1")
            .with_fallbacks(Vec::<String>::new());
        let gateway = AiGateway::without_providers(config).with_provider("mock-", Arc::new(Reply(reply)));
        StructuredExtractor::new(Arc::new(gateway))
    }

    fn scraper(factory: Arc<FakeFactory>, reply: &'static str) -> SourceScraper {
        SourceScraper::new(
            JobSource::Seek,
            factory,
            extractor(reply),
            ScraperConfig::fast(),
        )
    }

    #[test]
    fn test_board_for_each_source() {
        for source in JobSource::ALL {
            assert_eq!(board_for(source).source(), source);
        }
    }

    #[tokio::test]
    async fn test_scrape_reconciles_model_output_with_links() {
        let factory = Arc::new(FakeFactory::new());
        let reply = r#"[{"title": "Senior Rust Engineer", "company": "Acme", "location": "Sydney"}]"#;
        let report = scraper(factory.clone(), reply)
            .scrape(&SearchRequest::new("rust").unwrap())
            .await;

        assert_eq!(report.stage, ScrapeStage::Reconciled);
        assert!(report.is_complete());
        assert_eq!(report.dom_links, 2);
        assert_eq!(report.jobs.len(), 1);
        assert_eq!(report.jobs[0].url, "https://www.seek.com.au/job/1");
        assert_eq!(report.jobs[0].confidence, MatchConfidence::Reconciled);
        assert!(report.session_released);
        assert_eq!(factory.launches.load(Ordering::SeqCst), 1);
        assert_eq!(factory.calls.lock().unwrap().closed, 1);
        assert_eq!(
            factory.calls.lock().unwrap().navigated,
            vec!["https://www.seek.com.au/rust-jobs".to_string()]
        );
    }

    #[tokio::test]
    async fn test_marker_timeout_is_not_fatal() {
        let mut factory = FakeFactory::new();
        factory.marker_times_out = true;
        let report = scraper(Arc::new(factory), "[]")
            .scrape(&SearchRequest::new("rust").unwrap())
            .await;

        assert_eq!(report.stage, ScrapeStage::Reconciled);
        // Empty model output falls back to the page links.
        assert_eq!(report.jobs.len(), 2);
        assert!(report.jobs.iter().all(|j| j.confidence == MatchConfidence::DomOnly));
    }

    #[tokio::test]
    async fn test_navigation_failure_still_closes_session() {
        let mut factory = FakeFactory::new();
        factory.fail_navigation = true;
        let factory = Arc::new(factory);
        let report = scraper(factory.clone(), "[]")
            .scrape(&SearchRequest::new("rust").unwrap())
            .await;

        assert!(report.jobs.is_empty());
        assert_eq!(report.stage, ScrapeStage::SessionOpen);
        assert!(!report.is_complete());
        assert!(report.error.is_some());
        assert!(report.session_released);
        assert_eq!(factory.calls.lock().unwrap().closed, 1);
    }

    #[tokio::test]
    async fn test_unparseable_reply_uses_dom_fallback() {
        let factory = Arc::new(FakeFactory::new());
        let report = scraper(factory, "Sorry, I can't help with that.")
            .scrape(&SearchRequest::new("rust").unwrap())
            .await;

        assert_eq!(report.jobs.len(), 2);
        assert!(!report.ai_exhausted);
        assert!(report.error.is_some());
    }

    #[tokio::test]
    async fn test_launch_failure_reported() {
        let report = SourceScraper::new(
            JobSource::Indeed,
            Arc::new(crate::browser::UnavailableSessionFactory),
            extractor("[]"),
            ScraperConfig::fast(),
        )
        .scrape(&SearchRequest::new("rust").unwrap())
        .await;

        assert_eq!(report.stage, ScrapeStage::Idle);
        assert!(!report.is_complete());
        assert!(report.jobs.is_empty());
        assert!(!report.session_released);
        assert!(report.error.is_some());
    }
}
