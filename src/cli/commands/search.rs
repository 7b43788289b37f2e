//! Job search command.

use std::sync::Arc;

use console::style;

use jobscout::ai::AiGateway;
use jobscout::browser::default_factory;
use jobscout::config::Config;
use jobscout::extract::StructuredExtractor;
use jobscout::models::{JobSource, ScrapedJobRecord, SearchRequest};
use jobscout::store::{JobStore, JsonFileStore};
use jobscout::Aggregator;

use super::spinner;
use crate::cli::icons::{dim_arrow, error, info, success, warn};

/// Parsed arguments of `search`.
pub struct SearchOptions {
    pub keywords: String,
    pub location: Option<String>,
    pub sources: Vec<JobSource>,
    pub max_results: usize,
    pub json: bool,
    pub save: bool,
}

impl SearchOptions {
    fn request(&self) -> anyhow::Result<SearchRequest> {
        let mut request = SearchRequest::new(self.keywords.as_str())?
            .with_max_results(self.max_results);
        if let Some(location) = &self.location {
            request = request.with_location(location.as_str());
        }
        if !self.sources.is_empty() {
            request = request.with_sources(self.sources.iter().copied());
        }
        request.validate()?;
        Ok(request)
    }
}

/// Search the requested boards and print or save the results.
pub async fn cmd_search(config: &Config, options: SearchOptions) -> anyhow::Result<()> {
    let request = options.request()?;

    let gateway = Arc::new(AiGateway::new(config.ai.clone()));
    if !gateway.is_enabled() {
        eprintln!(
            "{} AI extraction disabled, results come from page links only",
            warn()
        );
    }
    let aggregator = Aggregator::new(
        default_factory(&config.browser),
        StructuredExtractor::new(gateway),
        config.scraper.clone(),
    );

    let boards: Vec<&str> = request
        .ordered_sources()
        .iter()
        .map(|s| s.display_name())
        .collect();
    let pb = spinner(format!(
        "Searching {} for \"{}\"...",
        boards.join(", "),
        request.keywords
    ));
    let outcome = aggregator.search_all(&request).await;
    pb.finish_and_clear();
    let results = outcome?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&results.jobs)?);
    } else {
        for job in &results.jobs {
            print_job(job);
        }
    }

    for report in &results.reports {
        match &report.error {
            Some(e) if report.jobs.is_empty() => eprintln!(
                "{} {}: no jobs ({})",
                error(),
                report.source.display_name(),
                e
            ),
            _ => eprintln!(
                "{} {}: {} jobs, {} page links",
                info(),
                report.source.display_name(),
                report.jobs.len(),
                report.dom_links
            ),
        }
    }
    eprintln!("{} {} unique jobs", success(), results.len());

    if options.save && !results.is_empty() {
        let path = config.store_path();
        let mut store = JsonFileStore::open(&path).await?;
        let summary = store.upsert(&results.jobs).await?;
        eprintln!(
            "{} Saved to {} ({} new, {} updated)",
            success(),
            path.display(),
            summary.inserted,
            summary.updated
        );
    }

    Ok(())
}

fn print_job(job: &ScrapedJobRecord) {
    let mut line = format!(
        "{} {} {}",
        style(&job.title).bold(),
        style("at").dim(),
        job.company
    );
    if job.confidence.is_low() {
        line.push_str(&format!(" {}", style("(unverified)").yellow()));
    }
    println!("{}", line);

    let mut details = vec![job.location.clone()];
    if let Some(salary) = &job.salary {
        details.push(salary.clone());
    }
    if let Some(work_type) = &job.work_type {
        details.push(work_type.clone());
    }
    if job.remote {
        details.push("remote".to_string());
    }
    details.push(job.source.display_name().to_string());
    println!("  {} {}", dim_arrow(), details.join(" | "));
    println!("  {} {}", dim_arrow(), style(&job.url).cyan());
}
