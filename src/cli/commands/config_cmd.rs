//! Configuration inspection commands.

use console::style;

use jobscout::config::Config;

use crate::cli::icons::{dim_arrow, info};

/// Print the effective configuration as TOML. API keys are never serialized.
pub fn cmd_config_show(config: &Config) -> anyhow::Result<()> {
    let rendered = toml::to_string_pretty(config)?;
    if rendered.trim().is_empty() {
        eprintln!("{} Using built-in defaults", info());
    } else {
        println!("{}", rendered);
    }

    let keys = [
        ("Anthropic", config.ai.anthropic_api_key.is_some()),
        ("Gemini", config.ai.gemini_api_key.is_some()),
        ("OpenAI", config.ai.openai_api_key.is_some()),
    ];
    for (provider, present) in keys {
        let state = if present {
            style("set").green()
        } else {
            style("not set").dim()
        };
        eprintln!("  {} {} API key: {}", dim_arrow(), provider, state);
    }
    Ok(())
}

/// Print the config file location and the job store path.
pub fn cmd_config_path(config: &Config) -> anyhow::Result<()> {
    match &config.source_path {
        Some(path) => println!("config: {}", path.display()),
        None => println!("config: (none found, using defaults)"),
    }
    println!("store:  {}", config.store_path().display());
    Ok(())
}
