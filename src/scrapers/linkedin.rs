//! LinkedIn public guest job search.

use url::Url;

use super::links::{card_links, CardSelectors};
use super::reconcile::MatchPolicy;
use super::{JobBoard, Pacing};
use crate::models::{DomLink, JobSource, SearchRequest};

const ORIGIN: &str = "https://www.linkedin.com";

const RESULTS_MARKER: &str = ".jobs-search__results-list, .base-search-card, .job-card-container";

const CARDS: CardSelectors = CardSelectors {
    card: ".base-search-card, .job-card-container, [data-job-id]",
    link: r#"a.base-card__full-link, a[href*="/jobs/view/"]"#,
    title: Some(".base-search-card__title, .job-card-list__title, h3"),
    company: Some(".base-search-card__subtitle, .job-card-container__company-name, h4"),
};

pub struct LinkedIn;

impl JobBoard for LinkedIn {
    fn source(&self) -> JobSource {
        JobSource::LinkedIn
    }

    fn origin(&self) -> &'static str {
        ORIGIN
    }

    fn search_url(&self, request: &SearchRequest) -> String {
        let mut url = format!(
            "{}/jobs/search?keywords={}",
            ORIGIN,
            urlencoding::encode(&request.keywords)
        );
        if let Some(location) = &request.location {
            url.push_str(&format!("&location={}", urlencoding::encode(location)));
        }
        url
    }

    fn results_selector(&self) -> &'static str {
        RESULTS_MARKER
    }

    fn pacing(&self) -> Pacing {
        Pacing {
            pre_navigation_ms: 2000,
            post_navigation_ms: 3000,
            final_settle_ms: 1500,
        }
    }

    /// Listing titles are often reworded, so company names also count.
    fn match_policy(&self) -> MatchPolicy {
        MatchPolicy::with_company(15, 10)
    }

    fn default_location(&self) -> &'static str {
        "Unknown"
    }

    fn extract_links(&self, html: &str, limit: usize) -> Vec<DomLink> {
        let Ok(origin) = Url::parse(ORIGIN) else {
            return Vec::new();
        };
        card_links(html, &CARDS, &origin, limit)
    }
}
