//! Browser sessions for scraping anti-bot protected job boards.
//!
//! Scrapers talk to a `BrowserSession` through a `SessionFactory`; the
//! production factory launches a stealth-configured Chrome over CDP
//! (chromiumoxide, `browser` feature). Each session owns its own browser
//! process and must be closed by whoever created it.

pub mod behavior;
#[cfg(feature = "browser")]
mod chromium;
mod stealth;

pub use behavior::{human_pause, simulate_scroll, ScrollPolicy};
#[cfg(feature = "browser")]
pub use chromium::StealthSessionFactory;
pub use stealth::{stealth_scripts, StealthPatch};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::BrowserConfig;

/// Failure to start a browser session.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Chrome/Chromium not found. Install it or set CHROME_PATH ({0})")]
    BinaryNotFound(String),

    #[error("Invalid browser configuration: {0}")]
    Config(String),

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Failed to prepare page: {0}")]
    Page(String),

    #[error("Browser support not compiled in (enable the `browser` feature)")]
    Unavailable,
}

/// Failure of an operation on an open session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Timed out after {}s waiting for {what}", .after.as_secs())]
    Timeout { what: String, after: Duration },

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Page script failed: {0}")]
    Script(String),

    #[error("Session already closed")]
    Closed,
}

impl SessionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SessionError::Timeout { .. })
    }
}

/// One isolated browser with a single page.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate the page, failing if it has not loaded within `timeout`.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), SessionError>;

    /// Wait until an element matching `selector` exists.
    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), SessionError>;

    /// Total scrollable height of the document body in pixels.
    async fn scroll_height(&mut self) -> Result<u64, SessionError>;

    /// Scroll the window down by `pixels`.
    async fn scroll_by(&mut self, pixels: u64) -> Result<(), SessionError>;

    /// Rendered text of the document body.
    async fn visible_text(&mut self) -> Result<String, SessionError>;

    /// Serialized DOM of the current page.
    async fn html(&mut self) -> Result<String, SessionError>;

    /// Release the page and the browser process. Safe to call more than once.
    async fn close(&mut self);
}

/// Creates isolated browser sessions.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create_session(&self) -> Result<Box<dyn BrowserSession>, LaunchError>;
}

/// Factory used when the crate is built without the `browser` feature.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSessionFactory;

#[async_trait]
impl SessionFactory for UnavailableSessionFactory {
    async fn create_session(&self) -> Result<Box<dyn BrowserSession>, LaunchError> {
        Err(LaunchError::Unavailable)
    }
}

/// The production session factory for this build.
#[cfg(feature = "browser")]
pub fn default_factory(config: &BrowserConfig) -> Arc<dyn SessionFactory> {
    Arc::new(StealthSessionFactory::new(config.clone()))
}

/// The production session factory for this build.
#[cfg(not(feature = "browser"))]
pub fn default_factory(_config: &BrowserConfig) -> Arc<dyn SessionFactory> {
    Arc::new(UnavailableSessionFactory)
}
