//! jobscout - job board scraping with AI-assisted listing extraction.
//!
//! Searches Seek, LinkedIn and Indeed through stealth browser sessions,
//! extracts listings from the rendered pages with a language model, and
//! reconciles them against links read from the markup.

#![allow(clippy::should_implement_trait)]

pub mod aggregator;
pub mod ai;
pub mod browser;
pub mod config;
pub mod description;
pub mod extract;
pub mod models;
pub mod scrapers;
pub mod store;

pub use aggregator::{Aggregator, SearchResults};
pub use description::DescriptionFetcher;
