//! Indeed Australia.

use url::Url;

use super::links::{card_links, CardSelectors};
use super::reconcile::MatchPolicy;
use super::{JobBoard, Pacing};
use crate::models::{DomLink, JobSource, SearchRequest};

const ORIGIN: &str = "https://au.indeed.com";

const RESULTS_MARKER: &str = ".job_seen_beacon, .jobsearch-ResultsList, .result";

const CARDS: CardSelectors = CardSelectors {
    card: ".job_seen_beacon, .result, [data-jk]",
    link: "h2 a, .jobTitle a, a[data-jk]",
    title: None,
    company: Some(r#".companyName, [data-testid="company-name"]"#),
};

pub struct Indeed;

impl JobBoard for Indeed {
    fn source(&self) -> JobSource {
        JobSource::Indeed
    }

    fn origin(&self) -> &'static str {
        ORIGIN
    }

    fn search_url(&self, request: &SearchRequest) -> String {
        let mut url = format!("{}/jobs?q={}", ORIGIN, urlencoding::encode(&request.keywords));
        if let Some(location) = &request.location {
            url.push_str(&format!("&l={}", urlencoding::encode(location)));
        }
        url
    }

    fn results_selector(&self) -> &'static str {
        RESULTS_MARKER
    }

    fn pacing(&self) -> Pacing {
        Pacing {
            pre_navigation_ms: 1500,
            post_navigation_ms: 2500,
            final_settle_ms: 1000,
        }
    }

    fn match_policy(&self) -> MatchPolicy {
        MatchPolicy::title_only(15)
    }

    fn default_location(&self) -> &'static str {
        "Australia"
    }

    fn extract_links(&self, html: &str, limit: usize) -> Vec<DomLink> {
        let Ok(origin) = Url::parse(ORIGIN) else {
            return Vec::new();
        };
        card_links(html, &CARDS, &origin, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url() {
        let request = SearchRequest::new("c++ developer").unwrap();
        assert_eq!(
            Indeed.search_url(&request),
            "https://au.indeed.com/jobs?q=c%2B%2B%20developer"
        );
    }

    #[test]
    fn test_extract_links_resolves_relative() {
        let html = r#"
            <div class="job_seen_beacon">
              <h2 class="jobTitle"><a data-jk="abc123" href="/rc/clk?jk=abc123&amp;from=serp"><span>Backend Developer</span></a></h2>
              <span data-testid="company-name">Initech</span>
            </div>
        "#;
        let links = Indeed.extract_links(html, 20);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://au.indeed.com/rc/clk?jk=abc123&from=serp");
        assert_eq!(links[0].title, "Backend Developer");
        assert_eq!(links[0].company.as_deref(), Some("Initech"));
    }
}
