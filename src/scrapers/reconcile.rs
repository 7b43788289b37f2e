//! Pairing model-extracted listings with links read from the page.
//!
//! Model output carries the rich fields (company, salary, location) but its
//! titles and URLs are unreliable; markup links carry trustworthy URLs. A
//! listing is matched to the first link, in document order, whose title
//! contains the listing title's lowercased prefix.

use chrono::{DateTime, Utc};

use crate::models::{AiJobListing, DomLink, JobSource, MatchConfidence, ScrapedJobRecord};

/// Company placeholder for records built from a link alone.
pub const PLACEHOLDER_COMPANY: &str = "See listing";
const UNKNOWN_TITLE: &str = "Unknown Title";
const UNKNOWN_COMPANY: &str = "Unknown Company";

/// How loosely listings are matched to links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPolicy {
    /// Characters of the listing title compared against link titles.
    pub title_prefix_chars: usize,
    /// Also accept a link whose company contains this many leading
    /// characters of the listing company.
    pub company_prefix_chars: Option<usize>,
}

impl MatchPolicy {
    pub const fn title_only(title_prefix_chars: usize) -> Self {
        Self {
            title_prefix_chars,
            company_prefix_chars: None,
        }
    }

    pub const fn with_company(title_prefix_chars: usize, company_prefix_chars: usize) -> Self {
        Self {
            title_prefix_chars,
            company_prefix_chars: Some(company_prefix_chars),
        }
    }

    /// Whether `link` plausibly points at `listing`. Blank fields never match.
    pub fn matches(&self, listing: &AiJobListing, link: &DomLink) -> bool {
        if let Some(title) = listing.title() {
            let prefix = lowercase_prefix(title, self.title_prefix_chars);
            if !prefix.is_empty() && link.title.to_lowercase().contains(&prefix) {
                return true;
            }
        }

        if let (Some(chars), Some(company), Some(link_company)) =
            (self.company_prefix_chars, listing.company(), link.company.as_deref())
        {
            let prefix = lowercase_prefix(company, chars);
            if !prefix.is_empty() && link_company.to_lowercase().contains(&prefix) {
                return true;
            }
        }

        false
    }

    /// First link in document order matching `listing`.
    pub fn find_link<'a>(&self, listing: &AiJobListing, links: &'a [DomLink]) -> Option<&'a DomLink> {
        links.iter().find(|link| self.matches(listing, link))
    }
}

fn lowercase_prefix(s: &str, chars: usize) -> String {
    s.trim().to_lowercase().chars().take(chars).collect()
}

fn non_blank(s: Option<&String>) -> Option<String> {
    s.map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Board-level inputs for building records.
#[derive(Debug, Clone, Copy)]
pub struct RecordContext<'a> {
    pub source: JobSource,
    pub policy: MatchPolicy,
    /// The search results URL, used when no link matches.
    pub search_url: &'a str,
    /// Location from the request, if any.
    pub requested_location: Option<&'a str>,
    /// Board default when neither the model nor the request gives a location.
    pub default_location: &'a str,
    pub max_results: usize,
    pub scraped_at: DateTime<Utc>,
}

impl RecordContext<'_> {
    fn fallback_location(&self) -> String {
        self.requested_location
            .unwrap_or(self.default_location)
            .to_string()
    }
}

/// Build records from model listings, falling back to link-only records
/// when the model produced nothing usable.
pub fn build_records(
    ctx: &RecordContext<'_>,
    listings: &[AiJobListing],
    links: &[DomLink],
) -> Vec<ScrapedJobRecord> {
    let records: Vec<ScrapedJobRecord> = listings
        .iter()
        .filter(|l| l.is_usable())
        .take(ctx.max_results)
        .map(|listing| reconcile_listing(ctx, listing, links))
        .collect();

    if records.is_empty() && !links.is_empty() {
        return dom_only_records(ctx, links);
    }
    records
}

fn reconcile_listing(
    ctx: &RecordContext<'_>,
    listing: &AiJobListing,
    links: &[DomLink],
) -> ScrapedJobRecord {
    let matched = ctx.policy.find_link(listing, links);
    let (url, confidence) = match matched {
        Some(link) => (link.url.clone(), MatchConfidence::Reconciled),
        None => (ctx.search_url.to_string(), MatchConfidence::SearchPage),
    };

    ScrapedJobRecord {
        title: listing.title().unwrap_or(UNKNOWN_TITLE).to_string(),
        company: listing.company().unwrap_or(UNKNOWN_COMPANY).to_string(),
        location: non_blank(listing.location.as_ref()).unwrap_or_else(|| ctx.fallback_location()),
        salary: non_blank(listing.salary.as_ref()),
        url,
        posted_date: non_blank(listing.posted_date.as_ref()),
        work_type: non_blank(listing.work_type.as_ref()),
        remote: listing.remote.unwrap_or(false),
        source: ctx.source,
        confidence,
        scraped_at: ctx.scraped_at,
    }
}

/// One low-confidence record per link.
pub fn dom_only_records(ctx: &RecordContext<'_>, links: &[DomLink]) -> Vec<ScrapedJobRecord> {
    links
        .iter()
        .take(ctx.max_results)
        .map(|link| ScrapedJobRecord {
            title: link.title.clone(),
            company: link
                .company
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_COMPANY.to_string()),
            location: ctx.fallback_location(),
            salary: None,
            url: link.url.clone(),
            posted_date: None,
            work_type: None,
            remote: false,
            source: ctx.source,
            confidence: MatchConfidence::DomOnly,
            scraped_at: ctx.scraped_at,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(title: &str, company: &str) -> AiJobListing {
        AiJobListing {
            title: Some(title.to_string()),
            company: Some(company.to_string()),
            ..Default::default()
        }
    }

    fn link(url: &str, title: &str, company: Option<&str>) -> DomLink {
        DomLink {
            url: url.to_string(),
            title: title.to_string(),
            company: company.map(str::to_string),
        }
    }

    fn ctx(policy: MatchPolicy) -> RecordContext<'static> {
        RecordContext {
            source: JobSource::Seek,
            policy,
            search_url: "https://www.seek.com.au/rust-jobs",
            requested_location: None,
            default_location: "Australia",
            max_results: 10,
            scraped_at: Utc::now(),
        }
    }

    #[test]
    fn test_prefix_match_tolerates_truncation() {
        let policy = MatchPolicy::title_only(20);
        let l = listing("Senior React Developer - Fintech Platform", "Acme");
        let d = link("https://x/job/1", "Senior React Developer - Fintech Pla...", None);
        assert!(policy.matches(&l, &d));
    }

    #[test]
    fn test_prefix_mismatch_is_false_negative() {
        // Reworded titles do not match even when they describe the same job.
        let policy = MatchPolicy::title_only(15);
        let l = listing("Sr. React Developer", "Acme");
        let d = link("https://x/job/1", "Senior React Developer", None);
        assert!(!policy.matches(&l, &d));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let policy = MatchPolicy::title_only(15);
        let l = listing("RUST ENGINEER", "Acme");
        let d = link("https://x/job/1", "Rust Engineer (Remote)", None);
        assert!(policy.matches(&l, &d));
    }

    #[test]
    fn test_blank_title_never_matches() {
        let policy = MatchPolicy::title_only(20);
        let l = listing("   ", "Acme");
        let d = link("https://x/job/1", "Anything", None);
        assert!(!policy.matches(&l, &d));
    }

    #[test]
    fn test_company_match_when_enabled() {
        let l = listing("Completely Different Title", "Globex Corporation");
        let d = link("https://x/jobs/view/1", "Software Engineer", Some("Globex Corp Pty"));
        assert!(MatchPolicy::with_company(15, 10).matches(&l, &d));
        assert!(!MatchPolicy::title_only(15).matches(&l, &d));
    }

    #[test]
    fn test_first_match_wins_in_document_order() {
        let policy = MatchPolicy::title_only(15);
        let links = vec![
            link("https://x/job/1", "Rust Engineer - Team A", None),
            link("https://x/job/2", "Rust Engineer - Team B", None),
        ];
        let found = policy.find_link(&listing("Rust Engineer", "Acme"), &links);
        assert_eq!(found.map(|l| l.url.as_str()), Some("https://x/job/1"));
    }

    #[test]
    fn test_build_records_reconciles_and_falls_back_to_search_url() {
        let ctx = ctx(MatchPolicy::title_only(20));
        let listings = vec![
            AiJobListing {
                location: Some("Sydney NSW".to_string()),
                remote: Some(true),
                ..listing("Rust Engineer", "Acme")
            },
            listing("Haskell Wizard", "Initech"),
        ];
        let links = vec![link("https://www.seek.com.au/job/1", "Rust Engineer", None)];

        let records = build_records(&ctx, &listings, &links);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].url, "https://www.seek.com.au/job/1");
        assert_eq!(records[0].confidence, MatchConfidence::Reconciled);
        assert_eq!(records[0].location, "Sydney NSW");
        assert!(records[0].remote);
        assert_eq!(records[1].url, "https://www.seek.com.au/rust-jobs");
        assert_eq!(records[1].confidence, MatchConfidence::SearchPage);
        assert_eq!(records[1].location, "Australia");
    }

    #[test]
    fn test_build_records_dom_fallback() {
        let mut ctx = ctx(MatchPolicy::title_only(20));
        ctx.requested_location = Some("Melbourne");
        let links = vec![
            link("https://www.seek.com.au/job/1", "Rust Engineer", None),
            link("https://www.seek.com.au/job/2", "Go Engineer", Some("Hooli")),
        ];

        let records = build_records(&ctx, &[], &links);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.confidence == MatchConfidence::DomOnly));
        assert_eq!(records[0].company, PLACEHOLDER_COMPANY);
        assert_eq!(records[1].company, "Hooli");
        assert_eq!(records[0].location, "Melbourne");
        assert_eq!(records[1].url, "https://www.seek.com.au/job/2");
    }

    #[test]
    fn test_build_records_respects_max_results() {
        let mut ctx = ctx(MatchPolicy::title_only(20));
        ctx.max_results = 1;
        let listings = vec![listing("A", "X"), listing("B", "Y")];
        assert_eq!(build_records(&ctx, &listings, &[]).len(), 1);
    }

    #[test]
    fn test_unusable_listings_fall_back_to_links() {
        let ctx = ctx(MatchPolicy::title_only(20));
        let listings = vec![AiJobListing::default()];
        let links = vec![link("https://www.seek.com.au/job/7", "Rust Engineer", None)];
        let records = build_records(&ctx, &listings, &links);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].confidence, MatchConfidence::DomOnly);
    }

    #[test]
    fn test_nothing_in_nothing_out() {
        let ctx = ctx(MatchPolicy::title_only(20));
        assert!(build_records(&ctx, &[], &[]).is_empty());
    }
}
