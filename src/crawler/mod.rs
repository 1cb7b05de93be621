//! Crawler module: fetching, extraction, and crawl orchestration
//!
//! This module contains the network-facing half of the crate:
//! - HTTP fetching and response classification
//! - Content-URL extraction from listing pages
//! - The batched, retrying crawl orchestrator
//! - The end-to-end [`discover`] pipeline tying detection, strategy
//!   selection, and crawling together

pub mod extractor;
pub mod fetcher;
mod orchestrator;

pub use fetcher::{build_http_client, fetch_page, FetchResult};
pub use orchestrator::{
    CancelToken, CrawlResult, FailedPage, Orchestrator, PageFetchOutcome, PageStatus,
};

use crate::config::Config;
use crate::detect::{detect, DetectionResult};
use crate::strategy::{select, CrawlStrategy};
use crate::{PageFinderError, Result};
use url::Url;

/// Everything one discovery run produced
#[derive(Debug)]
pub struct Discovery {
    /// The seed URL the run started from
    pub seed_url: String,

    /// How the seed page was classified
    pub detection: DetectionResult,

    /// The strategy that drove the crawl; `None` when the seed had no
    /// pagination and was treated as the sole page
    pub strategy: Option<CrawlStrategy>,

    /// The crawl outcome
    pub result: CrawlResult,
}

/// Runs the full pipeline: fetch seed, detect, select, crawl
///
/// An unpaginated seed is not an error at this level; the seed page itself
/// is extracted and returned as a single-page result with no strategy.
///
/// # Arguments
///
/// * `seed_url` - The listing URL to start from
/// * `config` - Crawl tuning plus user-agent identity
/// * `cancel` - External cancellation signal
///
/// # Errors
///
/// Fails only before the crawl proper: invalid configuration, an
/// unfetchable seed page, or a malformed seed URL.
pub async fn discover(seed_url: &str, config: &Config, cancel: &CancelToken) -> Result<Discovery> {
    let parsed_seed = Url::parse(seed_url)?;
    let orchestrator = Orchestrator::new(config.crawler.clone(), &config.user_agent)?;

    tracing::info!("Fetching seed page: {}", seed_url);
    let client = build_http_client(&config.user_agent, config.crawler.timeout_seconds)?;
    let body = match fetch_page(&client, seed_url).await {
        FetchResult::Success { body, .. } => body,
        FetchResult::HttpError { status_code } => {
            return Err(PageFinderError::SeedFetch {
                url: seed_url.to_string(),
                message: format!("HTTP {status_code}"),
            })
        }
        FetchResult::Timeout => {
            return Err(PageFinderError::SeedFetch {
                url: seed_url.to_string(),
                message: "request timed out".to_string(),
            })
        }
        FetchResult::Network { error } => {
            return Err(PageFinderError::SeedFetch {
                url: seed_url.to_string(),
                message: error,
            })
        }
    };

    let detection = detect(seed_url, &body);
    tracing::info!(
        "Seed classified as {} (confidence {:.2})",
        detection.pagination_type,
        detection.confidence
    );

    match select(&detection) {
        Ok(strategy) => {
            let result = orchestrator.crawl(&strategy, cancel).await;
            Ok(Discovery {
                seed_url: seed_url.to_string(),
                detection,
                strategy: Some(strategy),
                result,
            })
        }
        Err(PageFinderError::UnsupportedPagination { .. }) => {
            tracing::info!("No pagination detected; extracting the seed page only");
            let extracted = extractor::extract_content_urls(&body, &parsed_seed);
            let mut result = CrawlResult::new();
            result.absorb(PageFetchOutcome {
                page_index: 0,
                page_url: seed_url.to_string(),
                status: PageStatus::Success,
                extracted_urls: extracted,
                attempt_count: 1,
                error: None,
            });
            Ok(Discovery {
                seed_url: seed_url.to_string(),
                detection,
                strategy: None,
                result,
            })
        }
        Err(e) => Err(e),
    }
}
