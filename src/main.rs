use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use podmix::aggregate::Aggregator;
use podmix::config::Config;
use podmix::feed::{build_client, FeedList, HttpFeedSource};
use podmix::output::{build, write_atomic};

#[derive(Parser, Debug)]
#[command(
    name = "podmix",
    about = "Combine the latest episode of each podcast feed into one RSS feed"
)]
struct Args {
    /// Settings file (optional; defaults apply when missing)
    #[arg(long, value_name = "FILE", default_value = "podmix.toml")]
    config: PathBuf,

    /// Feed list, overriding `feeds_path` from the settings file
    #[arg(long, value_name = "FILE")]
    feeds: Option<PathBuf>,

    /// Output file, overriding `output_path` from the settings file
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load settings from {}", args.config.display()))?;
    if let Some(feeds) = args.feeds {
        config.feeds_path = feeds;
    }
    if let Some(output) = args.output {
        config.output_path = output;
    }

    let feeds = FeedList::load(&config.feeds_path).with_context(|| {
        format!(
            "Failed to load feed list from {}",
            config.feeds_path.display()
        )
    })?;
    if feeds.is_empty() {
        tracing::warn!(path = %config.feeds_path.display(), "Feed list is empty");
    }

    let client = build_client().context("Failed to create HTTP client")?;
    let source = HttpFeedSource::new(client)
        .with_timeout(config.fetch_timeout())
        .with_max_feed_size(config.max_feed_bytes);
    let summary = Aggregator::new(source)
        .with_concurrency(config.concurrency)
        .run(&feeds)
        .await;

    let count = summary.items.len();
    let document = build(summary.items, &config.channel).context("Failed to render feed")?;
    write_atomic(&config.output_path, document.as_bytes()).with_context(|| {
        format!(
            "Failed to write combined feed to {}",
            config.output_path.display()
        )
    })?;

    println!(
        "Wrote {} with {} shows.",
        config.output_path.display(),
        count
    );
    Ok(())
}
