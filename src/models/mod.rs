//! Data models for job search requests and scraped listings.

mod job;
mod search;

pub use job::{AiJobListing, DomLink, JobPosting, JobSource, MatchConfidence, ScrapedJobRecord};
pub use search::{SearchError, SearchRequest, DEFAULT_MAX_RESULTS};
