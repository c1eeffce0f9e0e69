//! SiteWalker main entry point
//!
//! This is the command-line interface for the SiteWalker site crawler.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use sitewalker::config::{load_config_with_hash, validate, Config, CrawlSettings};
use sitewalker::output::{generate_markdown_summary, print_summary, CrawlSummary};
use sitewalker::processor::{LinkLogProcessor, Processor};
use sitewalker::SiteCrawler;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// SiteWalker: crawls every reachable page of one site
///
/// SiteWalker honors robots.txt, seeds itself from the site's sitemaps,
/// follows links within the host and prints every crawled URL with the
/// links it contains.
#[derive(Parser, Debug)]
#[command(name = "sitewalker")]
#[command(version)]
#[command(about = "A single-host site crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Crawl this site instead of the configured base-url
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(base_url) = cli.base_url {
        tracing::info!("Overriding base-url with {}", base_url);
        config.crawler.base_url = base_url;
        validate(&config).context("Invalid --base-url")?;
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(&config, &config_hash).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitewalker=info,warn"),
            1 => EnvFilter::new("sitewalker=debug,info"),
            2 => EnvFilter::new("sitewalker=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== SiteWalker Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Base URL: {}", config.crawler.base_url);
    println!("  Workers per stage: {}", config.crawler.worker_pool_size);
    println!("  Request timeout: {}ms", config.crawler.request_timeout_ms);
    println!(
        "  Queue capacities: crawl {}, post-process {}",
        config.crawler.crawl_queue_capacity, config.crawler.process_queue_capacity
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.user_agent_string());

    println!("\nOutput:");
    match &config.output.summary_path {
        Some(path) => println!("  Summary: {}", path),
        None => println!("  Summary: (stdout only)"),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    let settings = CrawlSettings::try_from(config)?;
    let started_at = Utc::now();

    // Ctrl-C cancels the crawl; the crawler still drains and shuts down in order
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, cancelling crawl");
                cancel.cancel();
            }
        });
    }

    let link_log = Arc::new(LinkLogProcessor::new());
    let processors = vec![link_log.clone() as Arc<dyn Processor>];

    let crawler = SiteCrawler::new(settings, processors, &cancel).await?;
    let report = crawler.crawl(&cancel).await?;

    if cancel.is_cancelled() {
        tracing::warn!("Crawl was cancelled; the summary covers only completed pages");
    }

    let summary = CrawlSummary::new(crawler.base_url().as_str(), started_at, report, &link_log)
        .with_config_hash(config_hash);
    print_summary(&summary)?;

    if let Some(path) = &config.output.summary_path {
        generate_markdown_summary(&summary, Path::new(path))
            .with_context(|| format!("Failed to write summary to {}", path))?;
        println!("\n✓ Summary exported to: {}", path);
    }

    Ok(())
}
