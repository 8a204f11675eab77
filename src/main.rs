use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use feedwatch::pipeline::{LogSink, Pipeline};
use feedwatch::Config;

#[derive(Parser, Debug)]
#[command(name = "feedwatch", about = "Polls RSS feeds and detects new items")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, value_name = "FILE", default_value = "feedwatch.toml")]
    config: PathBuf,

    /// Feed URL list file (overrides the config)
    #[arg(long, value_name = "FILE")]
    feeds: Option<PathBuf>,

    /// Processed-state file (overrides the config)
    #[arg(long, value_name = "FILE")]
    state: Option<PathBuf>,

    /// Suppress the end-of-pass summary line
    #[arg(long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    if let Some(feeds) = args.feeds {
        config.feeds_file = feeds;
    }
    if let Some(state) = args.state {
        config.state_file = state;
    }

    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .build()
        .context("Failed to build HTTP client")?;

    let pipeline = Pipeline::new(&config, client);
    let mut sink = LogSink;
    let summary = pipeline
        .run_pass(&mut sink)
        .await
        .context("Pass aborted")?;

    if !args.quiet {
        println!(
            "Processed {} feeds ({} failed), {} new items",
            summary.feeds_processed, summary.feeds_failed, summary.new_items
        );
    }

    Ok(())
}
