//! Persistence of scraped jobs, keyed by URL.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::ScrapedJobRecord;

/// Counts from one upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub inserted: usize,
    pub updated: usize,
}

/// Somewhere scraped jobs are kept between searches.
#[async_trait]
pub trait JobStore: Send {
    /// Insert new jobs and refresh existing ones, matching on `url`.
    async fn upsert(&mut self, jobs: &[ScrapedJobRecord]) -> Result<UpsertSummary>;
}

/// A stored job with first/last sighting times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredJob {
    #[serde(flatten)]
    pub record: ScrapedJobRecord,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Jobs kept in a single JSON file, rewritten on every upsert.
pub struct JsonFileStore {
    path: PathBuf,
    jobs: Vec<StoredJob>,
    index: HashMap<String, usize>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let jobs: Vec<StoredJob> = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse job store {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read job store {}", path.display()))
            }
        };

        let index = jobs
            .iter()
            .enumerate()
            .map(|(i, job)| (job.record.url.clone(), i))
            .collect();
        debug!("Opened job store {} ({} jobs)", path.display(), jobs.len());

        Ok(Self { path, jobs, index })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored jobs in insertion order.
    pub fn jobs(&self) -> &[StoredJob] {
        &self.jobs
    }

    pub fn get(&self, url: &str) -> Option<&StoredJob> {
        self.index.get(url).map(|&i| &self.jobs[i])
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    async fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let content = serde_json::to_string_pretty(&self.jobs)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl JobStore for JsonFileStore {
    async fn upsert(&mut self, jobs: &[ScrapedJobRecord]) -> Result<UpsertSummary> {
        let now = Utc::now();
        let mut summary = UpsertSummary::default();

        for job in jobs {
            match self.index.get(&job.url) {
                Some(&i) => {
                    let stored = &mut self.jobs[i];
                    stored.record = job.clone();
                    stored.last_seen = now;
                    summary.updated += 1;
                }
                None => {
                    self.index.insert(job.url.clone(), self.jobs.len());
                    self.jobs.push(StoredJob {
                        record: job.clone(),
                        first_seen: now,
                        last_seen: now,
                    });
                    summary.inserted += 1;
                }
            }
        }

        self.save().await?;
        info!(
            "Saved {} new and {} updated jobs to {}",
            summary.inserted,
            summary.updated,
            self.path.display()
        );
        Ok(summary)
    }
}
