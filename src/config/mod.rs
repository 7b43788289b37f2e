//! Configuration management using the prefer crate for discovery.
//!
//! A `jobscout.{toml,yaml,json}` file is discovered in the standard
//! locations; every section falls back to defaults and environment
//! variables override file values.

mod browser;
mod scraper;

pub use browser::{BrowserConfig, DEFAULT_USER_AGENT, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
pub use scraper::ScraperConfig;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::ai::AiConfig;

/// Where scraped jobs are upserted when no path is configured.
pub const DEFAULT_STORE_PATH: &str = "~/.jobscout/jobs.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
}

/// Configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// JSON file scraped jobs are upserted into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<String>,
    /// AI gateway and model selection.
    #[serde(default, skip_serializing_if = "AiConfig::is_default")]
    pub ai: AiConfig,
    /// Browser launch settings.
    #[serde(default, skip_serializing_if = "BrowserConfig::is_default")]
    pub browser: BrowserConfig,
    /// Scraper pacing and timeouts.
    #[serde(default, skip_serializing_if = "ScraperConfig::is_default")]
    pub scraper: ScraperConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ai: AiConfig::default(),
            browser: BrowserConfig::default(),
            scraper: ScraperConfig::default(),
            store_path: None,
            source_path: None,
        }
    }
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to defaults with env overrides when nothing is found.
    pub async fn load() -> Self {
        match prefer::load("jobscout").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            warn!("{}; using defaults", e);
                            Self::default_with_env()
                        }
                    }
                } else {
                    Self::default_with_env()
                }
            }
            Err(e) => {
                debug!("No config file discovered: {}", e);
                Self::default_with_env()
            }
        }
    }

    /// Create a default config with environment variable overrides applied.
    pub fn default_with_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_err = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| parse_err("TOML", e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_err("YAML", e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| parse_err("JSON", e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config.with_env_overrides())
    }

    /// Apply environment overrides to every section.
    pub fn with_env_overrides(mut self) -> Self {
        self.ai = self.ai.with_env_overrides();
        self.browser = self.browser.with_env_overrides();
        self.scraper = self.scraper.with_env_overrides();
        self
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved against the config file directory (or CWD)
    pub fn resolve_path(&self, path_str: &str) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir().unwrap_or_default().join(path)
        }
    }

    /// Effective location of the job store.
    pub fn store_path(&self) -> PathBuf {
        self.resolve_path(self.store_path.as_deref().unwrap_or(DEFAULT_STORE_PATH))
    }
}
