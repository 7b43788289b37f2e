//! Job listing models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// External job boards the scraper knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobSource {
    Seek,
    LinkedIn,
    Indeed,
}

impl JobSource {
    /// All sources in iteration order (also the dedup precedence order).
    pub const ALL: [JobSource; 3] = [JobSource::Seek, JobSource::LinkedIn, JobSource::Indeed];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobSource::Seek => "seek",
            JobSource::LinkedIn => "linkedin",
            JobSource::Indeed => "indeed",
        }
    }

    /// Human-readable board name, used in prompts and log lines.
    pub fn display_name(&self) -> &'static str {
        match self {
            JobSource::Seek => "Seek",
            JobSource::LinkedIn => "LinkedIn",
            JobSource::Indeed => "Indeed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "seek" => Some(JobSource::Seek),
            "linkedin" => Some(JobSource::LinkedIn),
            "indeed" => Some(JobSource::Indeed),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for JobSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str(s).ok_or_else(|| {
            format!(
                "Unknown job source '{}'. Valid options: seek, linkedin, indeed",
                s
            )
        })
    }
}

/// How a record's URL was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    /// AI-extracted fields matched to a link read from the page markup.
    Reconciled,
    /// AI-extracted fields with no matching link; URL points at the search page.
    SearchPage,
    /// Built from a markup link alone because AI extraction yielded nothing.
    DomOnly,
}

impl MatchConfidence {
    pub fn is_low(&self) -> bool {
        !matches!(self, MatchConfidence::Reconciled)
    }
}

/// A job listing as emitted by a source scraper.
///
/// `url` is always absolute and is the identity key used for deduplication
/// and for upserts by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedJobRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_type: Option<String>,
    #[serde(default)]
    pub remote: bool,
    pub source: JobSource,
    pub confidence: MatchConfidence,
    pub scraped_at: DateTime<Utc>,
}

/// A job link read directly from page markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomLink {
    pub url: String,
    pub title: String,
    pub company: Option<String>,
}

/// Best-effort listing returned by the model before reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiJobListing {
    pub title: Option<String>,
    pub company: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub salary: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub posted_date: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub work_type: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub remote: Option<bool>,
}

impl AiJobListing {
    /// Title with surrounding whitespace removed, if non-empty.
    pub fn title(&self) -> Option<&str> {
        non_blank(self.title.as_deref())
    }

    pub fn company(&self) -> Option<&str> {
        non_blank(self.company.as_deref())
    }

    /// Whether the model produced anything worth turning into a record.
    pub fn is_usable(&self) -> bool {
        self.title().is_some() || self.company().is_some()
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Models answer `remote` with booleans, nulls or free text ("Hybrid").
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => Some(b),
        serde_json::Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "remote" | "hybrid" | "wfh" | "work from home" => Some(true),
            "false" | "no" | "onsite" | "on-site" | "in office" => Some(false),
            _ => None,
        },
        serde_json::Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    })
}

/// Models sometimes answer text fields with numbers (`"salary": 120000`).
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Structured view of a full job posting page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobPosting {
    pub job_title: String,
    pub company: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    pub job_description: String,
}
