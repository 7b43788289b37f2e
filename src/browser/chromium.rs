//! Stealth Chrome sessions over the DevTools protocol.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, NavigateParams,
};
use chromiumoxide::{Browser, BrowserConfig as CdpBrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::stealth::stealth_scripts;
use super::{BrowserSession, LaunchError, SessionError, SessionFactory};
use crate::config::{BrowserConfig, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};

/// Common Chrome executable paths to check.
const CHROME_PATHS: &[&str] = &[
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/opt/google/chrome/google-chrome",
];

const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// How often `wait_for_selector` re-queries the DOM.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Time allowed for the browser process to exit after close.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Launches one stealth-configured Chrome per session.
pub struct StealthSessionFactory {
    config: BrowserConfig,
}

impl StealthSessionFactory {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    fn find_chrome(&self) -> Result<PathBuf, LaunchError> {
        if let Some(path) = &self.config.chrome_path {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(LaunchError::BinaryNotFound(format!(
                "configured path {} does not exist",
                path.display()
            )));
        }

        for path in CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                debug!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in [
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(path) = which::which(cmd) {
                debug!("Found Chrome in PATH: {}", path.display());
                return Ok(path);
            }
        }

        Err(LaunchError::BinaryNotFound(
            "searched common install paths and PATH".to_string(),
        ))
    }

    fn launch_config(&self, chrome: PathBuf) -> Result<CdpBrowserConfig, LaunchError> {
        let mut builder = CdpBrowserConfig::builder().chrome_executable(chrome);

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = self.config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--window-size={},{}", VIEWPORT_WIDTH, VIEWPORT_HEIGHT))
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        builder.build().map_err(LaunchError::Config)
    }

    /// Apply the stealth fingerprint before the first navigation.
    async fn prepare_page(&self, page: &Page) -> Result<(), LaunchError> {
        let page_err = |e: chromiumoxide::error::CdpError| LaunchError::Page(e.to_string());

        let mut ua = SetUserAgentOverrideParams::new(self.config.user_agent.clone());
        ua.accept_language = Some(ACCEPT_LANGUAGE.to_string());
        page.execute(ua).await.map_err(page_err)?;

        page.execute(SetDeviceMetricsOverrideParams::new(
            VIEWPORT_WIDTH,
            VIEWPORT_HEIGHT,
            1.0,
            false,
        ))
        .await
        .map_err(page_err)?;

        let headers = Headers::new(serde_json::json!({
            "Accept-Language": ACCEPT_LANGUAGE,
            "Accept": "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
            "Cache-Control": "max-age=0",
            "Sec-Fetch-Dest": "document",
            "Sec-Fetch-Mode": "navigate",
            "Sec-Fetch-Site": "none",
            "Sec-Fetch-User": "?1",
            "Upgrade-Insecure-Requests": "1",
        }));
        page.execute(SetExtraHttpHeadersParams::new(headers))
            .await
            .map_err(page_err)?;

        if self.config.stealth {
            for patch in stealth_scripts() {
                if let Err(e) = page
                    .execute(AddScriptToEvaluateOnNewDocumentParams::new(patch.source))
                    .await
                {
                    debug!("Stealth patch {} skipped: {}", patch.name, e);
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl SessionFactory for StealthSessionFactory {
    async fn create_session(&self) -> Result<Box<dyn BrowserSession>, LaunchError> {
        let chrome = self.find_chrome()?;
        let config = self.launch_config(chrome)?;

        info!("Launching browser (headless={})", self.config.headless);
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| LaunchError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let mut session = ChromiumSession {
            browser,
            page: None,
            handler_task,
            closed: false,
        };

        let page = match session.browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                session.close().await;
                return Err(LaunchError::Page(e.to_string()));
            }
        };

        if let Err(e) = self.prepare_page(&page).await {
            session.page = Some(page);
            session.close().await;
            return Err(e);
        }

        session.page = Some(page);
        Ok(Box::new(session))
    }
}

/// A launched browser with one prepared page.
struct ChromiumSession {
    browser: Browser,
    page: Option<Page>,
    handler_task: JoinHandle<()>,
    closed: bool,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page, SessionError> {
        self.page.as_ref().ok_or(SessionError::Closed)
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T, SessionError> {
        self.page()?
            .evaluate(script.to_string())
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| SessionError::Script(e.to_string()))
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), SessionError> {
        info!("Navigating to {}", url);
        let params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| SessionError::Navigation(format!("invalid URL {}: {}", url, e)))?;

        let page = self.page()?;
        tokio::time::timeout(timeout, page.execute(params))
            .await
            .map_err(|_| SessionError::Timeout {
                what: format!("navigation to {}", url),
                after: timeout,
            })?
            .map_err(|e| SessionError::Navigation(format!("{}: {}", url, e)))?;

        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), SessionError> {
        let page = self.page()?;
        let poll = async {
            loop {
                if page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| SessionError::Timeout {
                what: format!("selector {}", selector),
                after: timeout,
            })
    }

    async fn scroll_height(&mut self) -> Result<u64, SessionError> {
        let height: f64 = self
            .eval("document.body ? document.body.scrollHeight : 0")
            .await?;
        Ok(height.max(0.0) as u64)
    }

    async fn scroll_by(&mut self, pixels: u64) -> Result<(), SessionError> {
        self.page()?
            .evaluate(format!("window.scrollBy(0, {})", pixels))
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?;
        Ok(())
    }

    async fn visible_text(&mut self) -> Result<String, SessionError> {
        self.eval("document.body ? document.body.innerText : ''")
            .await
    }

    async fn html(&mut self) -> Result<String, SessionError> {
        self.page()?
            .content()
            .await
            .map_err(|e| SessionError::Script(e.to_string()))
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(page) = self.page.take() {
            let _ = page.close().await;
        }

        if let Err(e) = self.browser.close().await {
            warn!("Browser close failed: {}", e);
        }
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, self.browser.wait())
            .await
            .is_err()
        {
            warn!("Browser did not exit within {}s", SHUTDOWN_TIMEOUT.as_secs());
        }
        self.handler_task.abort();
        debug!("Browser session closed");
    }
}
