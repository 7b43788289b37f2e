//! CLI parser and command dispatch.

mod config_cmd;
mod describe;
mod search;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use jobscout::config::Config;
use jobscout::models::{JobSource, DEFAULT_MAX_RESULTS};

#[derive(Parser)]
#[command(name = "jobscout")]
#[command(about = "Search job boards and extract listings with AI")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Search job boards for listings
    Search {
        /// Search keywords, e.g. "react developer"
        #[arg(required = true)]
        keywords: Vec<String>,

        /// Location to search in
        #[arg(short, long)]
        location: Option<String>,

        /// Boards to search (comma-separated: seek,linkedin,indeed)
        #[arg(short, long, value_delimiter = ',')]
        sources: Vec<JobSource>,

        /// Maximum listings per board
        #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_RESULTS)]
        max_results: usize,

        /// Model used for extraction (overrides config)
        #[arg(short, long)]
        model: Option<String>,

        /// Skip AI extraction and use page links only
        #[arg(long)]
        no_ai: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Upsert results into the job store
        #[arg(long)]
        save: bool,
    },

    /// Fetch the full text of a job posting
    Describe {
        /// Posting URL
        url: String,

        /// Parse the posting into structured fields with AI
        #[arg(short, long)]
        parse: bool,

        /// Model used for parsing (overrides config)
        #[arg(short, long)]
        model: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration (secrets omitted)
    Show,
    /// Show where configuration and the job store live
    Path,
}

async fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Ok(Config::load_from_path(&path).await?)
        }
        None => Ok(Config::load().await),
    }
}

/// Spinner shown on stderr while a long operation runs.
fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config).await?;

    match cli.command {
        Commands::Search {
            keywords,
            location,
            sources,
            max_results,
            model,
            no_ai,
            json,
            save,
        } => {
            if let Some(model) = model {
                config.ai = config.ai.with_model(&model);
            }
            if no_ai {
                config.ai = config.ai.disabled();
            }
            let options = search::SearchOptions {
                keywords: keywords.join(" "),
                location,
                sources,
                max_results,
                json,
                save,
            };
            search::cmd_search(&config, options).await
        }
        Commands::Describe {
            url,
            parse,
            model,
            json,
        } => {
            if let Some(model) = model {
                config.ai = config.ai.with_model(&model);
            }
            describe::cmd_describe(&config, &url, parse, json).await
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => config_cmd::cmd_config_show(&config),
            ConfigCommands::Path => config_cmd::cmd_config_path(&config),
        },
    }
}
