//! Seek (seek.com.au).

use url::Url;

use super::links::anchor_links;
use super::reconcile::MatchPolicy;
use super::{JobBoard, Pacing};
use crate::models::{DomLink, JobSource, SearchRequest};

const ORIGIN: &str = "https://www.seek.com.au";

const RESULTS_MARKER: &str =
    r#"[data-testid="job-card"], article, .job-card, [data-automation="jobCard"]"#;

const JOB_ANCHORS: &str =
    r#"article a[href*="/job/"], [data-testid="job-card"] a, a[data-automation="jobTitle"]"#;

pub struct Seek;

impl JobBoard for Seek {
    fn source(&self) -> JobSource {
        JobSource::Seek
    }

    fn origin(&self) -> &'static str {
        ORIGIN
    }

    /// `/{keywords}-jobs`, then `/in-{location}`.
    fn search_url(&self, request: &SearchRequest) -> String {
        let mut url = format!("{}/{}-jobs", ORIGIN, urlencoding::encode(&request.keywords));
        if let Some(location) = &request.location {
            url.push_str(&format!("/in-{}", urlencoding::encode(location)));
        }
        url
    }

    fn results_selector(&self) -> &'static str {
        RESULTS_MARKER
    }

    fn pacing(&self) -> Pacing {
        Pacing {
            pre_navigation_ms: 1000,
            post_navigation_ms: 2000,
            final_settle_ms: 0,
        }
    }

    fn match_policy(&self) -> MatchPolicy {
        MatchPolicy::title_only(20)
    }

    fn default_location(&self) -> &'static str {
        "Australia"
    }

    fn extract_links(&self, html: &str, limit: usize) -> Vec<DomLink> {
        let Ok(origin) = Url::parse(ORIGIN) else {
            return Vec::new();
        };
        anchor_links(html, JOB_ANCHORS, "/job/", &origin, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url() {
        let request = SearchRequest::new("React Developer").unwrap();
        assert_eq!(
            Seek.search_url(&request),
            "https://www.seek.com.au/React%20Developer-jobs"
        );

        let request = request.with_location("Sydney NSW");
        assert_eq!(
            Seek.search_url(&request),
            "https://www.seek.com.au/React%20Developer-jobs/in-Sydney%20NSW"
        );
    }

    #[test]
    fn test_extract_links() {
        let html = r#"
            <article data-testid="job-card">
              <a data-automation="jobTitle" href="/job/81234567?type=standard">Senior Rust Engineer</a>
              <a href="/companies/acme-123">Acme</a>
            </article>
            <article>
              <a href="/job/81234568">Platform Engineer</a>
            </article>
        "#;
        let links = Seek.extract_links(html, 20);
        assert_eq!(links.len(), 2);
        assert_eq!(
            links[0].url,
            "https://www.seek.com.au/job/81234567?type=standard"
        );
        assert_eq!(links[0].title, "Senior Rust Engineer");
        assert_eq!(links[1].title, "Platform Engineer");
    }
}
