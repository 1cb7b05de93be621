//! Pagefinder main entry point
//!
//! Command-line interface for the paginated-listing discovery crawler.

use anyhow::{bail, Context};
use clap::Parser;
use pagefinder::config::{load_config_with_hash, Config};
use pagefinder::crawler::{build_http_client, discover, fetch_page, CancelToken, FetchResult};
use pagefinder::output::{estimate_crawl_time, print_summary, write_json_report, CrawlReport};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Pagefinder: discover content pages behind paginated listings
///
/// Pagefinder inspects a seed listing page to work out how the site
/// paginates, then crawls every listing page it can derive, collecting a
/// deduplicated set of content URLs into a JSON report.
#[derive(Parser, Debug)]
#[command(name = "pagefinder")]
#[command(version)]
#[command(about = "Discover content pages behind paginated listings", long_about = None)]
struct Cli {
    /// Seed listing URL to analyze and crawl
    #[arg(value_name = "URL")]
    seed_url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured page ceiling
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Write the JSON report to this path instead of the configured one
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Classify the seed page and exit without crawling
    #[arg(long)]
    detect_only: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // Load configuration, or run entirely on defaults
    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            tracing::info!("Configuration loaded (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }

    if cli.detect_only {
        handle_detect_only(&cli.seed_url, &config).await?;
    } else {
        handle_discover(&cli, config, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pagefinder=info,warn"),
            1 => EnvFilter::new("pagefinder=debug,info"),
            2 => EnvFilter::new("pagefinder=trace,debug"),
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

/// Handles --detect-only: classify the seed page and print the result
async fn handle_detect_only(seed_url: &str, config: &Config) -> anyhow::Result<()> {
    let client = build_http_client(&config.user_agent, config.crawler.timeout_seconds)?;

    tracing::info!("Fetching seed page: {}", seed_url);
    let body = match fetch_page(&client, seed_url).await {
        FetchResult::Success { body, .. } => body,
        other => bail!("failed to fetch seed page {seed_url}: {other:?}"),
    };

    let detection = pagefinder::detect(seed_url, &body);
    println!("{}", serde_json::to_string_pretty(&detection)?);

    if let Some(total_pages) = detection.total_pages {
        let pages = total_pages.min(config.crawler.max_pages);
        let estimate = estimate_crawl_time(
            pages,
            config.crawler.rate_limit_delay,
            config.crawler.concurrent_batches,
        );
        eprintln!("\nA full crawl of {} pages would take roughly {:.0}s", pages, estimate);
    }

    Ok(())
}

/// Handles the full discovery run
async fn handle_discover(
    cli: &Cli,
    config: Config,
    config_hash: Option<String>,
) -> anyhow::Result<()> {
    // Ctrl-C cancels the crawl but keeps the partial result
    let cancel = CancelToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing in-flight fetches");
            signal_token.cancel();
        }
    });

    let discovery = match discover(&cli.seed_url, &config, &cancel).await {
        Ok(discovery) => discovery,
        Err(e) => {
            tracing::error!("Discovery failed: {}", e);
            return Err(e.into());
        }
    };

    print_summary(&discovery);

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.results_path));
    let report = CrawlReport::from_discovery(&discovery, &config.crawler, config_hash.as_deref());
    write_json_report(&output_path, &report)?;

    println!("\nReport written to: {}", output_path.display());

    Ok(())
}
