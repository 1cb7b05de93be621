//! HTTP fetcher
//!
//! Issues single GET requests and classifies what came back. The fetcher
//! knows nothing about pagination or retries; the orchestrator owns the
//! retry policy and maps fetch results onto page outcomes.

use crate::config::UserAgentConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;

/// Result of a single fetch attempt
#[derive(Debug)]
pub enum FetchResult {
    /// Got a 2xx response
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value, if present
        content_type: Option<String>,
        /// Response body
        body: String,
    },

    /// Got a non-2xx response
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// The request exceeded the configured timeout
    Timeout,

    /// Connection-level failure (refused, TLS, DNS)
    Network {
        /// Error description
        error: String,
    },
}

/// Builds the HTTP client shared by every fetch in a crawl
///
/// The User-Agent identifies the crawler with contact details; the Accept
/// headers mirror what a browser sends, since some listing endpoints vary
/// their response on them.
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout_seconds` - Per-request timeout
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout_seconds: u64,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

    Client::builder()
        .user_agent(user_agent.user_agent_string())
        .default_headers(headers)
        .timeout(Duration::from_secs(timeout_seconds))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// One attempt, no retries. Redirects are followed by the client; the
/// final URL is reported so callers can track where a page actually lives.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
pub async fn fetch_page(client: &Client, url: &str) -> FetchResult {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();
            let final_url = response.url().to_string();

            if !status.is_success() {
                return FetchResult::HttpError {
                    status_code: status.as_u16(),
                };
            }

            let content_type = response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string());

            match response.text().await {
                Ok(body) => FetchResult::Success {
                    final_url,
                    status_code: status.as_u16(),
                    content_type,
                    body,
                },
                Err(e) if e.is_timeout() => FetchResult::Timeout,
                Err(e) => FetchResult::Network {
                    error: e.to_string(),
                },
            }
        }
        Err(e) => {
            if e.is_timeout() {
                FetchResult::Timeout
            } else if e.is_connect() {
                FetchResult::Network {
                    error: "Connection failed".to_string(),
                }
            } else {
                FetchResult::Network {
                    error: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&create_test_config(), 30);
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_success() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html>hello</html>")
                    .insert_header("content-type", "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;

        let client = build_http_client(&create_test_config(), 5).unwrap();
        let result = fetch_page(&client, &format!("{}/page", server.uri())).await;

        match result {
            FetchResult::Success {
                status_code,
                content_type,
                body,
                ..
            } => {
                assert_eq!(status_code, 200);
                assert_eq!(content_type.as_deref(), Some("text/html; charset=utf-8"));
                assert!(body.contains("hello"));
            }
            other => panic!("Expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = build_http_client(&create_test_config(), 5).unwrap();
        let result = fetch_page(&client, &format!("{}/missing", server.uri())).await;

        assert!(matches!(
            result,
            FetchResult::HttpError { status_code: 404 }
        ));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let client = build_http_client(&create_test_config(), 2).unwrap();
        // Port 1 is essentially never listening
        let result = fetch_page(&client, "http://127.0.0.1:1/").await;
        assert!(matches!(
            result,
            FetchResult::Network { .. } | FetchResult::Timeout
        ));
    }
}
