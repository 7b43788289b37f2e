//! Human-like pacing: jittered pauses and incremental scrolling.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use super::BrowserSession;

/// How `simulate_scroll` moves down a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollPolicy {
    /// Pixels per scroll step.
    pub step_px: u64,
    /// Shortest pause between steps.
    pub min_interval: Duration,
    /// Longest pause between steps.
    pub max_interval: Duration,
    /// Stop after this many pixels even if the page is taller.
    pub max_distance_px: u64,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self {
            step_px: 100,
            min_interval: Duration::from_millis(100),
            max_interval: Duration::from_millis(300),
            max_distance_px: 3000,
        }
    }
}

impl ScrollPolicy {
    /// Same geometry with no pauses between steps.
    pub fn without_pauses() -> Self {
        Self {
            min_interval: Duration::ZERO,
            max_interval: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Uniform random duration in `[min, max]`.
fn jitter(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let ms = rand::rng().random_range(min.as_millis() as u64..=max.as_millis() as u64);
    Duration::from_millis(ms)
}

/// Sleep `base_ms` plus up to `jitter_ms` random milliseconds.
pub async fn human_pause(base_ms: u64, jitter_ms: u64) {
    let pause = jitter(
        Duration::from_millis(base_ms),
        Duration::from_millis(base_ms + jitter_ms),
    );
    if !pause.is_zero() {
        tokio::time::sleep(pause).await;
    }
}

/// Scroll down in fixed steps with jittered pauses until the page height is
/// covered or the policy's distance cap is reached.
///
/// Best-effort: any session error simply ends the scroll. Returns the
/// distance scrolled in pixels.
pub async fn simulate_scroll(session: &mut dyn BrowserSession, policy: &ScrollPolicy) -> u64 {
    let step = policy.step_px.max(1);
    let mut scrolled = 0u64;

    loop {
        let height = match session.scroll_height().await {
            Ok(h) => h,
            Err(e) => {
                debug!("Scroll stopped, could not read page height: {}", e);
                break;
            }
        };

        if let Err(e) = session.scroll_by(step).await {
            debug!("Scroll stopped: {}", e);
            break;
        }
        scrolled += step;

        if scrolled >= height || scrolled >= policy.max_distance_px {
            break;
        }

        let pause = jitter(policy.min_interval, policy.max_interval);
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    debug!("Scrolled {}px", scrolled);
    scrolled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::SessionError;
    use async_trait::async_trait;

    /// Page of fixed height that records scroll calls.
    struct TallPage {
        height: u64,
        steps: u64,
        fail_after: Option<u64>,
    }

    #[async_trait]
    impl BrowserSession for TallPage {
        async fn navigate(&mut self, _url: &str, _timeout: Duration) -> Result<(), SessionError> {
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
            Ok(self.height)
        }

        async fn scroll_by(&mut self, _pixels: u64) -> Result<(), SessionError> {
            if self.fail_after == Some(self.steps) {
                return Err(SessionError::Closed);
            }
            self.steps += 1;
            Ok(())
        }

        async fn visible_text(&mut self) -> Result<String, SessionError> {
            Ok(String::new())
        }

        async fn html(&mut self) -> Result<String, SessionError> {
            Ok(String::new())
        }

        async fn close(&mut self) {}
    }

    fn page(height: u64) -> TallPage {
        TallPage {
            height,
            steps: 0,
            fail_after: None,
        }
    }

    #[tokio::test]
    async fn test_short_page_scrolls_to_bottom() {
        let mut session = page(450);
        let scrolled = simulate_scroll(&mut session, &ScrollPolicy::without_pauses()).await;
        assert_eq!(scrolled, 500);
        assert_eq!(session.steps, 5);
    }

    #[tokio::test]
    async fn test_infinite_page_capped() {
        let mut session = page(1_000_000);
        let scrolled = simulate_scroll(&mut session, &ScrollPolicy::without_pauses()).await;
        assert_eq!(scrolled, 3000);
        assert_eq!(session.steps, 30);
    }

    #[tokio::test]
    async fn test_session_error_ends_scroll() {
        let mut session = TallPage {
            fail_after: Some(2),
            ..page(10_000)
        };
        let scrolled = simulate_scroll(&mut session, &ScrollPolicy::without_pauses()).await;
        assert_eq!(scrolled, 200);
    }

    #[test]
    fn test_jitter_within_bounds() {
        let min = Duration::from_millis(100);
        let max = Duration::from_millis(300);
        for _ in 0..50 {
            let d = jitter(min, max);
            assert!(d >= min && d <= max);
        }
        assert_eq!(jitter(max, min), max);
    }

    #[tokio::test]
    async fn test_zero_pause_returns_immediately() {
        human_pause(0, 0).await;
    }
}
