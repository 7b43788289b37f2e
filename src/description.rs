//! Full text of a single job posting.

use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::browser::{human_pause, BrowserSession, SessionFactory};
use crate::config::ScraperConfig;
use crate::scrapers::ScrapeError;

/// Pixels scrolled to trigger lazily loaded description sections.
const DESCRIPTION_SCROLL_PX: u64 = 500;

/// Opens a posting in a fresh session and returns its visible text.
pub struct DescriptionFetcher {
    sessions: Arc<dyn SessionFactory>,
    config: ScraperConfig,
}

impl DescriptionFetcher {
    pub fn new(sessions: Arc<dyn SessionFactory>, config: ScraperConfig) -> Self {
        Self { sessions, config }
    }

    /// Fetch the rendered text of `url`.
    ///
    /// Unlike a search scrape this propagates failures. The session is
    /// always closed.
    pub async fn fetch_full_text(&self, url: &str) -> Result<String, ScrapeError> {
        let parsed = Url::parse(url).map_err(|_| ScrapeError::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScrapeError::InvalidUrl(url.to_string()));
        }

        if self.config.human_delays {
            human_pause(1000, 3000).await;
        }

        let mut session = self.sessions.create_session().await?;

        // Inner function so the session is closed on every path
        let result = self.fetch_inner(session.as_mut(), parsed.as_str()).await;
        session.close().await;

        let text = result?;
        info!("Fetched {} chars from {}", text.len(), url);
        Ok(text)
    }

    async fn fetch_inner(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
    ) -> Result<String, ScrapeError> {
        session
            .navigate(url, self.config.description_timeout())
            .await?;

        if let Err(e) = session.scroll_by(DESCRIPTION_SCROLL_PX).await {
            debug!("Scroll on {} failed: {}", url, e);
        }
        if self.config.human_delays {
            human_pause(1000, 1000).await;
        }

        Ok(session.visible_text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{LaunchError, SessionError, UnavailableSessionFactory};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Posting {
        closed: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl BrowserSession for Posting {
        async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), SessionError> {
            if self.fail {
                return Err(SessionError::Navigation(url.to_string()));
            }
            Ok(())
        }

        async fn wait_for_selector(
            &mut self,
            _selector: &str,
            _timeout: Duration,
        ) -> Result<(), SessionError> {
            Ok(())
        }

        async fn scroll_height(&mut self) -> Result<u64, SessionError> {
            Ok(0)
        }

        async fn scroll_by(&mut self, _pixels: u64) -> Result<(), SessionError> {
            Err(SessionError::Script("no window".to_string()))
        }

        async fn visible_text(&mut self) -> Result<String, SessionError> {
            Ok("Senior Rust Engineer\nAbout the role...".to_string())
        }

        async fn html(&mut self) -> Result<String, SessionError> {
            Ok(String::new())
        }

        async fn close(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct PostingFactory {
        closed: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl SessionFactory for PostingFactory {
        async fn create_session(&self) -> Result<Box<dyn BrowserSession>, LaunchError> {
            Ok(Box::new(Posting {
                closed: self.closed.clone(),
                fail: self.fail,
            }))
        }
    }

    fn fetcher(fail: bool) -> (DescriptionFetcher, Arc<AtomicUsize>) {
        let closed = Arc::new(AtomicUsize::new(0));
        let factory = PostingFactory {
            closed: closed.clone(),
            fail,
        };
        (
            DescriptionFetcher::new(Arc::new(factory), ScraperConfig::fast()),
            closed,
        )
    }

    #[tokio::test]
    async fn test_fetch_returns_text_and_closes() {
        let (fetcher, closed) = fetcher(false);
        let text = fetcher
            .fetch_full_text("https://www.seek.com.au/job/1")
            .await
            .unwrap();
        assert!(text.starts_with("Senior Rust Engineer"));
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_navigation_error_propagates_and_closes() {
        let (fetcher, closed) = fetcher(true);
        let err = fetcher
            .fetch_full_text("https://www.seek.com.au/job/1")
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Session(SessionError::Navigation(_))));
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_url_rejected_before_launch() {
        let (fetcher, closed) = fetcher(false);
        for url in ["not a url", "ftp://example.com/job"] {
            assert!(matches!(
                fetcher.fetch_full_text(url).await,
                Err(ScrapeError::InvalidUrl(_))
            ));
        }
        assert_eq!(closed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_launch_failure_propagates() {
        let fetcher = DescriptionFetcher::new(
            Arc::new(UnavailableSessionFactory),
            ScraperConfig::fast(),
        );
        assert!(matches!(
            fetcher.fetch_full_text("https://au.indeed.com/viewjob?jk=1").await,
            Err(ScrapeError::Launch(LaunchError::Unavailable))
        ));
    }
}
