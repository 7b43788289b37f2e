//! Job posting fetch command.

use std::sync::Arc;

use console::style;

use jobscout::ai::AiGateway;
use jobscout::browser::default_factory;
use jobscout::config::Config;
use jobscout::extract::{parse_job_posting, StructuredExtractor};
use jobscout::DescriptionFetcher;

use super::spinner;
use crate::cli::icons::{dim_arrow, success};

/// Fetch a posting's text, optionally parsing it into fields.
pub async fn cmd_describe(config: &Config, url: &str, parse: bool, json: bool) -> anyhow::Result<()> {
    let fetcher = DescriptionFetcher::new(default_factory(&config.browser), config.scraper.clone());

    let pb = spinner(format!("Fetching {}...", url));
    let fetched = fetcher.fetch_full_text(url).await;
    pb.finish_and_clear();
    let text = fetched?;

    if !parse {
        if json {
            println!("{}", serde_json::json!({ "url": url, "text": text }));
        } else {
            println!("{}", text);
        }
        return Ok(());
    }

    let extractor = StructuredExtractor::new(Arc::new(AiGateway::new(config.ai.clone())));
    let model = extractor.default_model().to_string();

    let pb = spinner(format!("Parsing posting with {}...", model));
    let parsed = parse_job_posting(&extractor, &text, url, &model).await;
    pb.finish_and_clear();
    let posting = parsed?;

    if json {
        println!("{}", serde_json::to_string_pretty(&posting)?);
        return Ok(());
    }

    eprintln!("{} Parsed posting", success());
    println!("{}", style(&posting.job_title).bold());
    println!("  {} {}", dim_arrow(), posting.company);
    if let Some(location) = &posting.location {
        println!("  {} {}", dim_arrow(), location);
    }
    if let Some(salary) = &posting.salary {
        println!("  {} {}", dim_arrow(), salary);
    }
    println!();
    println!("{}", posting.job_description);

    Ok(())
}
