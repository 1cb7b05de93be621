//! Batched crawl orchestration
//!
//! Drives every page a strategy generates through a fetch-extract loop:
//! batches of concurrent fetches for templated strategies, a strictly
//! sequential next-link chain for link-based ones. Per-page failures are
//! absorbed and reported as data; partial success is the expected common
//! case when crawling hundreds of third-party pages.

use crate::config::{validate_crawl_config, CrawlConfig, UserAgentConfig};
use crate::crawler::extractor::extract_content_urls;
use crate::crawler::fetcher::{build_http_client, fetch_page, FetchResult};
use crate::detect::{find_next_url, HtmlDocument};
use crate::strategy::{CrawlStrategy, StrategyKind};
use crate::url::normalize_url;
use crate::Result;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Ceiling on the exponential retry backoff
const MAX_BACKOFF_SECS: f64 = 30.0;

/// Consecutive batches allowed to produce nothing new before stopping
const EMPTY_BATCH_LIMIT: u32 = 2;

/// External cancellation signal for a running crawl
///
/// Cloneable handle around a shared flag. Cancelling lets in-flight fetches
/// in the current batch finish, stops further batches from being scheduled,
/// and the partial result comes back with its `cancelled` flag set.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; idempotent
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Terminal classification of one page fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    /// Fetched and extracted
    Success,
    /// Non-2xx response or connection failure after all retries
    HttpError,
    /// Timed out after all retries
    Timeout,
    /// Body was empty or not parseable markup; never retried
    ParseError,
}

/// The terminal record for one attempted page
///
/// Created once per page when its last attempt resolves; never mutated.
#[derive(Debug, Clone)]
pub struct PageFetchOutcome {
    /// Position of the page in the strategy's worklist
    pub page_index: u32,

    /// The URL that was fetched
    pub page_url: String,

    /// How the page resolved
    pub status: PageStatus,

    /// Content URLs extracted on success (possibly empty)
    pub extracted_urls: Vec<String>,

    /// Number of fetch attempts made (1 + retries used)
    pub attempt_count: u32,

    /// Error description for non-success statuses
    pub error: Option<String>,
}

/// A page whose final outcome was not success
#[derive(Debug, Clone, Serialize)]
pub struct FailedPage {
    pub page_index: u32,
    pub page_url: String,
    pub status: PageStatus,
    pub error: String,
}

/// The aggregate outcome of one crawl
///
/// Built incrementally inside a single orchestrator run and only exposed
/// once that run completes. Every attempted page is accounted for: it
/// either contributed to `total_pages_succeeded` or appears in
/// `failed_pages`.
#[derive(Debug, Serialize)]
pub struct CrawlResult {
    /// Pages whose fetch reached a terminal outcome
    pub total_pages_attempted: u32,

    /// Pages that fetched and extracted successfully
    pub total_pages_succeeded: u32,

    /// Normalized content URLs, duplicates collapsed
    pub deduplicated_urls: HashSet<String>,

    /// Failed pages in worklist order, each with its terminal error
    pub failed_pages: Vec<FailedPage>,

    /// Wall-clock duration of the crawl
    pub elapsed_seconds: f64,

    /// Whether the crawl was cut short by the cancellation signal
    pub cancelled: bool,
}

impl CrawlResult {
    pub(crate) fn new() -> Self {
        Self {
            total_pages_attempted: 0,
            total_pages_succeeded: 0,
            deduplicated_urls: HashSet::new(),
            failed_pages: Vec::new(),
            elapsed_seconds: 0.0,
            cancelled: false,
        }
    }

    /// Folds one page outcome into the aggregate, returning how many
    /// previously-unseen URLs it contributed
    pub(crate) fn absorb(&mut self, outcome: PageFetchOutcome) -> usize {
        self.total_pages_attempted += 1;

        if outcome.status == PageStatus::Success {
            self.total_pages_succeeded += 1;
            let mut new_urls = 0;
            for url in &outcome.extracted_urls {
                // Unnormalizable URLs are kept verbatim rather than dropped
                let key = normalize_url(url)
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| url.clone());
                if self.deduplicated_urls.insert(key) {
                    new_urls += 1;
                }
            }
            new_urls
        } else {
            tracing::debug!(
                "Page {} ({}) failed as {:?} after {} attempts",
                outcome.page_index,
                outcome.page_url,
                outcome.status,
                outcome.attempt_count
            );
            self.failed_pages.push(FailedPage {
                page_index: outcome.page_index,
                page_url: outcome.page_url,
                status: outcome.status,
                error: outcome
                    .error
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
            0
        }
    }
}

/// The batched crawl engine
///
/// Owns the HTTP client and the validated crawl configuration; one
/// instance can run multiple crawls.
pub struct Orchestrator {
    client: Client,
    config: CrawlConfig,
}

impl Orchestrator {
    /// Creates an orchestrator, validating the configuration first
    ///
    /// # Errors
    ///
    /// Configuration validation failures surface here, before any network
    /// activity, as does an HTTP client build failure.
    pub fn new(config: CrawlConfig, user_agent: &UserAgentConfig) -> Result<Self> {
        validate_crawl_config(&config)?;
        let client = build_http_client(user_agent, config.timeout_seconds)?;
        Ok(Self { client, config })
    }

    /// Runs a full crawl for the given strategy
    ///
    /// Never fails: per-page errors are recorded in the result, and
    /// cancellation returns the partial result with its flag set.
    pub async fn crawl(&self, strategy: &CrawlStrategy, cancel: &CancelToken) -> CrawlResult {
        let started = Instant::now();
        let page_count = strategy.max_pages.min(self.config.max_pages);

        tracing::info!(
            "Starting {:?} crawl: up to {} pages, {} concurrent, {:.1}s delay",
            strategy.kind,
            page_count,
            self.config.concurrent_batches,
            self.config.rate_limit_delay
        );

        let mut result = if strategy.is_templated() {
            self.crawl_templated(strategy, page_count, cancel).await
        } else {
            self.crawl_chain(strategy, page_count, cancel).await
        };

        result.elapsed_seconds = started.elapsed().as_secs_f64();

        tracing::info!(
            "Crawl finished: {}/{} pages succeeded, {} unique URLs, {} failures in {:.1}s{}",
            result.total_pages_succeeded,
            result.total_pages_attempted,
            result.deduplicated_urls.len(),
            result.failed_pages.len(),
            result.elapsed_seconds,
            if result.cancelled { " (cancelled)" } else { "" }
        );

        result
    }

    /// Crawls an eagerly-generated worklist in sequential batches of
    /// concurrent fetches
    ///
    /// Peak in-flight requests equal `concurrent_batches`; batch N+1 never
    /// starts until every fetch in batch N has reached a terminal outcome,
    /// which is what makes the zero-new-URL termination check well-defined.
    async fn crawl_templated(
        &self,
        strategy: &CrawlStrategy,
        page_count: u32,
        cancel: &CancelToken,
    ) -> CrawlResult {
        let mut result = CrawlResult::new();
        let batch_size = self.config.concurrent_batches as usize;
        let positions: Vec<u32> = (0..page_count).collect();

        // An indicator strategy is only a guess at the conventional page
        // parameter; give up on it after a single empty batch.
        let empty_batch_limit = match strategy.kind {
            StrategyKind::IndicatorBased => 1,
            _ => EMPTY_BATCH_LIMIT,
        };
        let mut consecutive_empty = 0u32;

        for (batch_number, batch) in positions.chunks(batch_size).enumerate() {
            // Per-worker pacing: each worker's next request is separated
            // from its previous one by at least the configured delay.
            if batch_number > 0 && self.config.rate_limit_delay > 0.0 {
                tokio::time::sleep(Duration::from_secs_f64(self.config.rate_limit_delay)).await;
            }

            // Checked after the pacing delay so a signal raised while this
            // batch was waiting stops it from ever being issued
            if cancel.is_cancelled() {
                tracing::info!("Cancellation requested, stopping before batch {}", batch_number + 1);
                result.cancelled = true;
                break;
            }

            let mut handles = Vec::with_capacity(batch.len());
            for &position in batch {
                let url = strategy.page_url(position);
                handles.push(tokio::spawn(fetch_with_retries(
                    self.client.clone(),
                    position,
                    url,
                    self.config.max_retries,
                    self.config.rate_limit_delay,
                )));
            }

            // Join in spawn order so outcomes land in worklist order
            let mut new_in_batch = 0usize;
            for (&position, handle) in batch.iter().zip(handles) {
                let (outcome, _body) = match handle.await {
                    Ok(pair) => pair,
                    Err(e) => (
                        PageFetchOutcome {
                            page_index: position,
                            page_url: strategy.page_url(position),
                            status: PageStatus::HttpError,
                            extracted_urls: Vec::new(),
                            attempt_count: 0,
                            error: Some(format!("fetch task failed: {e}")),
                        },
                        None,
                    ),
                };
                new_in_batch += result.absorb(outcome);
            }

            if new_in_batch == 0 {
                consecutive_empty += 1;
                if consecutive_empty >= empty_batch_limit {
                    tracing::info!(
                        "No new URLs for {} consecutive batch(es), stopping at page {}",
                        consecutive_empty,
                        result.total_pages_attempted
                    );
                    break;
                }
            } else {
                consecutive_empty = 0;
            }
        }

        result
    }

    /// Walks a next-link chain one page at a time
    ///
    /// Page N+1's URL only exists inside page N, so there is nothing to
    /// parallelize; the chain ends when a page has no next link, when a
    /// fetch fails terminally, or when the page budget runs out.
    async fn crawl_chain(
        &self,
        strategy: &CrawlStrategy,
        page_count: u32,
        cancel: &CancelToken,
    ) -> CrawlResult {
        let mut result = CrawlResult::new();

        let mut current = match url::Url::parse(&strategy.url_template) {
            Ok(url) => url,
            Err(e) => {
                result.absorb(PageFetchOutcome {
                    page_index: 0,
                    page_url: strategy.url_template.clone(),
                    status: PageStatus::ParseError,
                    extracted_urls: Vec::new(),
                    attempt_count: 0,
                    error: Some(format!("invalid chain start URL: {e}")),
                });
                return result;
            }
        };

        let mut visited: HashSet<String> = HashSet::new();

        for position in 0..page_count {
            if position > 0 && self.config.rate_limit_delay > 0.0 {
                tokio::time::sleep(Duration::from_secs_f64(self.config.rate_limit_delay)).await;
            }

            if cancel.is_cancelled() {
                result.cancelled = true;
                break;
            }

            let (outcome, body) = fetch_with_retries(
                self.client.clone(),
                position,
                current.to_string(),
                self.config.max_retries,
                self.config.rate_limit_delay,
            )
            .await;

            visited.insert(current.to_string());
            result.absorb(outcome);

            // A failed page leaves us with no next link to follow
            let Some(body) = body else {
                break;
            };

            let doc = HtmlDocument::parse(&body, &current);
            match find_next_url(&doc, &current) {
                Some(next) if !visited.contains(next.as_str()) => current = next,
                Some(next) => {
                    tracing::debug!("Next link loops back to {}, stopping chain", next);
                    break;
                }
                None => {
                    tracing::debug!("No next link on {}, chain complete", current);
                    break;
                }
            }
        }

        result
    }
}

/// Fetches one page to a terminal outcome, retrying transient failures
///
/// A bounded state machine: each iteration is one attempt, HTTP errors and
/// timeouts back off exponentially (`delay * 2^(attempt-1)`, capped) until
/// the retry budget is spent, and unparseable bodies fail immediately since
/// retrying cannot fix a structural problem. Returns the outcome plus the
/// body on success, for callers that need to look inside the page.
async fn fetch_with_retries(
    client: Client,
    page_index: u32,
    url: String,
    max_retries: u32,
    backoff_base: f64,
) -> (PageFetchOutcome, Option<String>) {
    let mut attempt = 0u32;

    let parsed = match url::Url::parse(&url) {
        Ok(parsed) => parsed,
        Err(e) => {
            return (
                PageFetchOutcome {
                    page_index,
                    page_url: url,
                    status: PageStatus::ParseError,
                    extracted_urls: Vec::new(),
                    attempt_count: 0,
                    error: Some(format!("invalid page URL: {e}")),
                },
                None,
            )
        }
    };

    loop {
        attempt += 1;

        let (status, error) = match fetch_page(&client, &url).await {
            FetchResult::Success {
                content_type, body, ..
            } => {
                if !looks_like_markup(content_type.as_deref(), &body) {
                    let outcome = PageFetchOutcome {
                        page_index,
                        page_url: url,
                        status: PageStatus::ParseError,
                        extracted_urls: Vec::new(),
                        attempt_count: attempt,
                        error: Some(match content_type {
                            Some(ct) => format!("unparseable response ({ct})"),
                            None => "empty response body".to_string(),
                        }),
                    };
                    return (outcome, None);
                }

                let extracted = extract_content_urls(&body, &parsed);
                tracing::debug!(
                    "Page {} ({}): {} content URLs",
                    page_index,
                    url,
                    extracted.len()
                );
                let outcome = PageFetchOutcome {
                    page_index,
                    page_url: url,
                    status: PageStatus::Success,
                    extracted_urls: extracted,
                    attempt_count: attempt,
                    error: None,
                };
                return (outcome, Some(body));
            }
            FetchResult::HttpError { status_code } => (
                PageStatus::HttpError,
                format!("HTTP {status_code}"),
            ),
            FetchResult::Timeout => (PageStatus::Timeout, "request timed out".to_string()),
            FetchResult::Network { error } => (PageStatus::HttpError, error),
        };

        if attempt > max_retries {
            let outcome = PageFetchOutcome {
                page_index,
                page_url: url,
                status,
                extracted_urls: Vec::new(),
                attempt_count: attempt,
                error: Some(error),
            };
            return (outcome, None);
        }

        let backoff = (backoff_base * 2f64.powi(attempt as i32 - 1)).min(MAX_BACKOFF_SECS);
        tracing::warn!(
            "Page {} attempt {}/{} failed ({}), retrying in {:.1}s",
            page_index,
            attempt,
            max_retries + 1,
            error,
            backoff
        );
        if backoff > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(backoff)).await;
        }
    }
}

/// Whether a response body is worth handing to the HTML parser
fn looks_like_markup(content_type: Option<&str>, body: &str) -> bool {
    if body.trim().is_empty() {
        return false;
    }
    match content_type {
        Some(ct) => {
            let ct = ct.to_lowercase();
            ct.contains("html") || ct.contains("xml")
        }
        // No Content-Type header: let the parser decide
        None => true,
    }
}
