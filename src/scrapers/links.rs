//! Job links read straight from result-page markup.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

use crate::models::DomLink;

/// Selectors for boards that render one card per job.
#[derive(Debug, Clone, Copy)]
pub struct CardSelectors {
    pub card: &'static str,
    pub link: &'static str,
    /// Title element inside the card; `None` uses the link text.
    pub title: Option<&'static str>,
    pub company: Option<&'static str>,
}

/// Collapse runs of whitespace into single spaces.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve an href against the board origin, keeping only http(s) URLs.
pub fn resolve_href(origin: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let url = origin.join(href).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("Invalid selector {:?}: {}", selector, e);
            None
        }
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

/// Accumulates unique links up to a limit.
struct LinkCollector {
    links: Vec<DomLink>,
    seen: HashSet<String>,
    limit: usize,
}

impl LinkCollector {
    fn new(limit: usize) -> Self {
        Self {
            links: Vec::new(),
            seen: HashSet::new(),
            limit,
        }
    }

    fn is_full(&self) -> bool {
        self.links.len() >= self.limit
    }

    fn push(&mut self, url: String, title: String, company: Option<String>) {
        if title.is_empty() || self.is_full() || !self.seen.insert(url.clone()) {
            return;
        }
        self.links.push(DomLink {
            url,
            title,
            company: company.filter(|c| !c.is_empty()),
        });
    }
}

/// Links from anchors matching `selector` whose href contains `href_marker`.
pub fn anchor_links(
    html: &str,
    selector: &str,
    href_marker: &str,
    origin: &Url,
    limit: usize,
) -> Vec<DomLink> {
    let Some(selector) = parse_selector(selector) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let mut collector = LinkCollector::new(limit);

    for anchor in document.select(&selector) {
        if collector.is_full() {
            break;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains(href_marker) {
            continue;
        }
        if let Some(url) = resolve_href(origin, href) {
            collector.push(url, element_text(anchor), None);
        }
    }

    collector.links
}

/// Links from job cards, with title and company read from inside each card.
pub fn card_links(html: &str, selectors: &CardSelectors, origin: &Url, limit: usize) -> Vec<DomLink> {
    let (Some(card_sel), Some(link_sel)) =
        (parse_selector(selectors.card), parse_selector(selectors.link))
    else {
        return Vec::new();
    };
    let title_sel = selectors.title.and_then(parse_selector);
    let company_sel = selectors.company.and_then(parse_selector);

    let document = Html::parse_document(html);
    let mut collector = LinkCollector::new(limit);

    for card in document.select(&card_sel) {
        if collector.is_full() {
            break;
        }
        let Some(link) = card.select(&link_sel).next() else {
            continue;
        };
        let Some(url) = link
            .value()
            .attr("href")
            .and_then(|href| resolve_href(origin, href))
        else {
            continue;
        };

        let title = match &title_sel {
            Some(sel) => match card.select(sel).next() {
                Some(el) => element_text(el),
                None => continue,
            },
            None => element_text(link),
        };
        let company = company_sel
            .as_ref()
            .and_then(|sel| card.select(sel).next())
            .map(element_text);

        collector.push(url, title, company);
    }

    collector.links
}
