//! Scraper pacing and timeout configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timeouts and pacing shared by every board scraper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Sleep with jitter around navigation, like a person would.
    /// Disable for tests or when replaying a local snapshot.
    #[serde(default = "default_human_delays")]
    pub human_delays: bool,

    /// Navigation timeout for search pages, in seconds.
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout: u64,

    /// How long to wait for a board's "results loaded" marker, in seconds.
    #[serde(default = "default_results_timeout")]
    pub results_timeout: u64,

    /// Navigation timeout when fetching a single posting, in seconds.
    #[serde(default = "default_description_timeout")]
    pub description_timeout: u64,

    /// Maximum links read from a results page.
    #[serde(default = "default_max_dom_links")]
    pub max_dom_links: usize,
}

fn default_human_delays() -> bool {
    true
}

fn default_navigation_timeout() -> u64 {
    60
}

fn default_results_timeout() -> u64 {
    30
}

fn default_description_timeout() -> u64 {
    30
}

fn default_max_dom_links() -> usize {
    20
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            human_delays: default_human_delays(),
            navigation_timeout: default_navigation_timeout(),
            results_timeout: default_results_timeout(),
            description_timeout: default_description_timeout(),
            max_dom_links: default_max_dom_links(),
        }
    }
}

impl ScraperConfig {
    /// Check if the config equals the default (for skip_serializing_if).
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Apply environment variable overrides.
    ///
    /// - `SCRAPER_HUMAN_DELAYS` - "false"/"0" disables pacing sleeps
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("SCRAPER_HUMAN_DELAYS") {
            self.human_delays = !(val.eq_ignore_ascii_case("false") || val == "0");
        }
        self
    }

    /// Config with pacing disabled and short timeouts, for local runs and tests.
    pub fn fast() -> Self {
        Self {
            human_delays: false,
            navigation_timeout: 5,
            results_timeout: 1,
            description_timeout: 5,
            ..Self::default()
        }
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout)
    }

    pub fn results_timeout(&self) -> Duration {
        Duration::from_secs(self.results_timeout)
    }

    pub fn description_timeout(&self) -> Duration {
        Duration::from_secs(self.description_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScraperConfig::default();
        assert!(config.human_delays);
        assert_eq!(config.navigation_timeout(), Duration::from_secs(60));
        assert_eq!(config.results_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_dom_links, 20);
    }

    #[test]
    fn test_fast_disables_pacing() {
        let config = ScraperConfig::fast();
        assert!(!config.human_delays);
        assert_eq!(config.max_dom_links, 20);
        assert!(!config.is_default());
    }

    #[test]
    fn test_yaml_partial() {
        let config: ScraperConfig = serde_yaml::from_str("human_delays: false\n").unwrap();
        assert!(!config.human_delays);
        assert_eq!(config.navigation_timeout, 60);
    }
}
