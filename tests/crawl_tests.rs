//! Integration tests for the discovery crawler
//!
//! These tests use wiremock to stand up mock listing sites and exercise
//! detection, strategy selection, and the crawl orchestrator end to end.

use pagefinder::config::{Config, CrawlConfig, UserAgentConfig};
use pagefinder::crawler::{discover, CancelToken, Orchestrator, PageStatus};
use pagefinder::detect::PaginationType;
use pagefinder::strategy::{CrawlStrategy, StrategyKind};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Crawl tuning for tests: no pacing, tight timeout
fn test_crawl_config(max_pages: u32, concurrent_batches: u32, max_retries: u32) -> CrawlConfig {
    CrawlConfig {
        max_pages,
        rate_limit_delay: 0.0,
        concurrent_batches,
        timeout_seconds: 5,
        max_retries,
    }
}

fn test_config(crawler: CrawlConfig) -> Config {
    Config {
        crawler,
        ..Config::default()
    }
}

/// A parameter-based strategy pointing at the mock server
fn parameter_strategy(server_uri: &str, listing_path: &str, max_pages: u32) -> CrawlStrategy {
    CrawlStrategy {
        kind: StrategyKind::ParameterBased,
        url_template: format!("{server_uri}{listing_path}?page={{page}}"),
        start_index: 1,
        step: 1,
        max_pages,
    }
}

/// A listing page body: `stories` unique content links plus pagination nav
fn listing_body(page: u32, stories: u32, total_pages: u32) -> String {
    let mut body = String::from("<html><body><ul>");
    for story in 0..stories {
        body.push_str(&format!(
            r#"<li><a href="/news/story-{page}-{story}">Story {page}-{story}</a></li>"#
        ));
    }
    body.push_str("</ul><nav>");
    for n in 1..=total_pages {
        body.push_str(&format!(r#"<a href="?page={n}">{n}</a>"#));
    }
    body.push_str("</nav></body></html>");
    body
}

fn html_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

#[tokio::test]
async fn test_end_to_end_parameter_crawl() {
    let server = MockServer::start().await;

    for page in 1..=5u32 {
        Mock::given(method("GET"))
            .and(path("/news"))
            .and(query_param("page", page.to_string()))
            .respond_with(html_response(listing_body(page, 3, 5)))
            .mount(&server)
            .await;
    }

    let config = test_config(test_crawl_config(1000, 5, 0));
    let seed = format!("{}/news?page=1", server.uri());
    let discovery = discover(&seed, &config, &CancelToken::new())
        .await
        .expect("discovery failed");

    assert_eq!(
        discovery.detection.pagination_type,
        PaginationType::ParameterBased
    );
    assert!(discovery.detection.confidence >= 0.8);
    assert_eq!(discovery.detection.page_parameter_name.as_deref(), Some("page"));
    assert_eq!(discovery.detection.total_pages, Some(5));

    let strategy = discovery.strategy.expect("expected a strategy");
    assert_eq!(strategy.kind, StrategyKind::ParameterBased);
    assert_eq!(strategy.max_pages, 5);

    assert_eq!(discovery.result.total_pages_attempted, 5);
    assert_eq!(discovery.result.total_pages_succeeded, 5);
    // 5 pages x 3 unique stories
    assert_eq!(discovery.result.deduplicated_urls.len(), 15);
    assert!(discovery.result.failed_pages.is_empty());
    assert!(!discovery.result.cancelled);
}

#[tokio::test]
async fn test_ten_pages_twenty_urls_each() {
    let server = MockServer::start().await;

    for page in 1..=10u32 {
        Mock::given(method("GET"))
            .and(path("/list"))
            .and(query_param("page", page.to_string()))
            .respond_with(html_response(listing_body(page, 20, 10)))
            .mount(&server)
            .await;
    }

    let orchestrator = Orchestrator::new(
        test_crawl_config(10, 5, 0),
        &UserAgentConfig::default(),
    )
    .unwrap();
    let strategy = parameter_strategy(&server.uri(), "/list", 10);

    let result = orchestrator.crawl(&strategy, &CancelToken::new()).await;

    assert_eq!(result.total_pages_succeeded, 10);
    assert_eq!(result.deduplicated_urls.len(), 200);
}

#[tokio::test]
async fn test_retry_bound_attempts_exactly_retries_plus_one() {
    let server = MockServer::start().await;

    // The expectation is the assertion: max_retries = 2 means exactly
    // three attempts, verified when the server shuts down.
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::new(
        test_crawl_config(1, 1, 2),
        &UserAgentConfig::default(),
    )
    .unwrap();
    let strategy = parameter_strategy(&server.uri(), "/list", 1);

    let result = orchestrator.crawl(&strategy, &CancelToken::new()).await;

    assert_eq!(result.total_pages_attempted, 1);
    assert_eq!(result.total_pages_succeeded, 0);
    assert_eq!(result.failed_pages.len(), 1);
    assert_eq!(result.failed_pages[0].status, PageStatus::HttpError);
    assert!(result.failed_pages[0].error.contains("500"));
}

#[tokio::test]
async fn test_timeout_recorded_as_timeout() {
    use std::time::Duration;

    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            html_response(listing_body(1, 2, 1)).set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = test_crawl_config(1, 1, 0);
    config.timeout_seconds = 1;
    let orchestrator = Orchestrator::new(config, &UserAgentConfig::default()).unwrap();
    let strategy = parameter_strategy(&server.uri(), "/slow", 1);

    let result = orchestrator.crawl(&strategy, &CancelToken::new()).await;

    assert_eq!(result.failed_pages.len(), 1);
    assert_eq!(result.failed_pages[0].status, PageStatus::Timeout);
}

#[tokio::test]
async fn test_non_html_body_fails_without_retry() {
    let server = MockServer::start().await;

    // A structural problem is not retried, so exactly one request lands
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("%PDF-1.4")
                .insert_header("content-type", "application/pdf"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::new(
        test_crawl_config(1, 1, 5),
        &UserAgentConfig::default(),
    )
    .unwrap();
    let strategy = parameter_strategy(&server.uri(), "/list", 1);

    let result = orchestrator.crawl(&strategy, &CancelToken::new()).await;

    assert_eq!(result.failed_pages.len(), 1);
    assert_eq!(result.failed_pages[0].status, PageStatus::ParseError);
}

#[tokio::test]
async fn test_early_termination_past_real_last_page() {
    let server = MockServer::start().await;

    // Pages 1-4 have fresh content; everything past them serves page 1's
    // content again, the way sites behave when the page parameter
    // overshoots the real range.
    for page in 1..=4u32 {
        Mock::given(method("GET"))
            .and(path("/list"))
            .and(query_param("page", page.to_string()))
            .respond_with(html_response(listing_body(page, 2, 4)))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(html_response(listing_body(1, 2, 4)))
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::new(
        test_crawl_config(100, 2, 0),
        &UserAgentConfig::default(),
    )
    .unwrap();
    let strategy = parameter_strategy(&server.uri(), "/list", 100);

    let result = orchestrator.crawl(&strategy, &CancelToken::new()).await;

    // Batches of 2: pages 1-4 are productive, pages 5-8 are two empty
    // batches, then the crawl stops well short of the 100-page budget.
    assert_eq!(result.total_pages_attempted, 8);
    assert_eq!(result.deduplicated_urls.len(), 8);
}

#[tokio::test]
async fn test_indicator_strategy_abandoned_after_one_empty_batch() {
    let server = MockServer::start().await;

    // Site ignores the guessed ?page parameter entirely
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(html_response(listing_body(1, 2, 1)))
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::new(
        test_crawl_config(30, 3, 0),
        &UserAgentConfig::default(),
    )
    .unwrap();
    let strategy = CrawlStrategy {
        kind: StrategyKind::IndicatorBased,
        url_template: format!("{}/list?page={{page}}", server.uri()),
        start_index: 1,
        step: 1,
        max_pages: 30,
    };

    let result = orchestrator.crawl(&strategy, &CancelToken::new()).await;

    // First batch finds the seed content, second finds nothing new, and an
    // indicator guess does not get a third
    assert_eq!(result.total_pages_attempted, 6);
    assert_eq!(result.deduplicated_urls.len(), 2);
}

#[tokio::test]
async fn test_config_ceiling_caps_strategy_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(html_response(listing_body(1, 2, 1)))
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::new(
        test_crawl_config(3, 3, 0),
        &UserAgentConfig::default(),
    )
    .unwrap();
    let strategy = parameter_strategy(&server.uri(), "/list", 100);

    let result = orchestrator.crawl(&strategy, &CancelToken::new()).await;

    assert_eq!(result.total_pages_attempted, 3);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html_response(listing_body(1, 2, 1)))
        .expect(0)
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::new(
        test_crawl_config(10, 5, 0),
        &UserAgentConfig::default(),
    )
    .unwrap();
    let strategy = parameter_strategy(&server.uri(), "/list", 10);

    let cancel = CancelToken::new();
    cancel.cancel();

    let result = orchestrator.crawl(&strategy, &cancel).await;

    assert!(result.cancelled);
    assert_eq!(result.total_pages_attempted, 0);
}

#[tokio::test]
async fn test_cancellation_mid_crawl_keeps_partial_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(html_response(listing_body(1, 2, 1)))
        .mount(&server)
        .await;

    let mut config = test_crawl_config(50, 5, 0);
    // The inter-batch pause gives the cancel signal a window that is
    // guaranteed to close before batch 2 is issued
    config.rate_limit_delay = 0.3;
    let orchestrator = Orchestrator::new(config, &UserAgentConfig::default()).unwrap();
    let strategy = parameter_strategy(&server.uri(), "/list", 50);

    let cancel = CancelToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let result = orchestrator.crawl(&strategy, &cancel).await;

    assert!(result.cancelled);
    // The first batch completed; nothing after it was issued
    assert!(result.total_pages_attempted <= 2 * 5);
    assert!(result.total_pages_attempted >= 1);
    assert!(!result.deduplicated_urls.is_empty());
}

#[tokio::test]
async fn test_link_chain_walked_sequentially() {
    let server = MockServer::start().await;

    let page = |stories: [&str; 2], next: Option<&str>| {
        let mut body = String::from("<html><body>");
        for story in stories {
            body.push_str(&format!(r#"<a href="/news/{story}">{story}</a>"#));
        }
        if let Some(next) = next {
            body.push_str(&format!(r#"<a href="{next}" rel="next">Next</a>"#));
        }
        body.push_str("</body></html>");
        body
    };

    Mock::given(method("GET"))
        .and(path("/archive"))
        .respond_with(html_response(page(["a1", "a2"], Some("/archive-2"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/archive-2"))
        .respond_with(html_response(page(["b1", "b2"], Some("/archive-3"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/archive-3"))
        .respond_with(html_response(page(["c1", "c2"], None)))
        .mount(&server)
        .await;

    let config = test_config(test_crawl_config(100, 5, 0));
    let seed = format!("{}/archive", server.uri());
    let discovery = discover(&seed, &config, &CancelToken::new())
        .await
        .expect("discovery failed");

    assert_eq!(discovery.detection.pagination_type, PaginationType::LinkBased);
    let strategy = discovery.strategy.expect("expected a strategy");
    assert_eq!(strategy.kind, StrategyKind::LinkBased);

    // The chain stops by itself when the last page has no next link
    assert_eq!(discovery.result.total_pages_attempted, 3);
    assert_eq!(discovery.result.total_pages_succeeded, 3);
    assert_eq!(discovery.result.deduplicated_urls.len(), 6);
}

#[tokio::test]
async fn test_unpaginated_seed_treated_as_single_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(html_response(
            r#"<html><body>
                <a href="/news/only-story">Only story</a>
                <a href="/news/another-story">Another</a>
            </body></html>"#
                .to_string(),
        ))
        .mount(&server)
        .await;

    let config = test_config(test_crawl_config(100, 5, 0));
    let seed = format!("{}/news", server.uri());
    let discovery = discover(&seed, &config, &CancelToken::new())
        .await
        .expect("discovery failed");

    assert_eq!(discovery.detection.pagination_type, PaginationType::None);
    assert_eq!(discovery.detection.confidence, 0.0);
    assert!(discovery.strategy.is_none());
    assert_eq!(discovery.result.total_pages_attempted, 1);
    assert_eq!(discovery.result.total_pages_succeeded, 1);
    assert_eq!(discovery.result.deduplicated_urls.len(), 2);
}

#[tokio::test]
async fn test_failed_pages_do_not_abort_the_crawl() {
    let server = MockServer::start().await;

    for page in [1u32, 3] {
        Mock::given(method("GET"))
            .and(path("/list"))
            .and(query_param("page", page.to_string()))
            .respond_with(html_response(listing_body(page, 2, 3)))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::new(
        test_crawl_config(3, 3, 0),
        &UserAgentConfig::default(),
    )
    .unwrap();
    let strategy = parameter_strategy(&server.uri(), "/list", 3);

    let result = orchestrator.crawl(&strategy, &CancelToken::new()).await;

    assert_eq!(result.total_pages_attempted, 3);
    assert_eq!(result.total_pages_succeeded, 2);
    assert_eq!(result.failed_pages.len(), 1);
    assert_eq!(result.failed_pages[0].page_index, 1);
    // The failing page's neighbors still contributed their URLs
    assert_eq!(result.deduplicated_urls.len(), 4);
}
