use serde::{Deserialize, Serialize};

/// Main configuration structure for pagefinder
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl tuning configuration
///
/// These five knobs fully describe how hard the orchestrator is allowed to
/// drive a target site. All of them are validated before a crawl starts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlConfig {
    /// Hard ceiling on the number of pages fetched in one crawl
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Minimum delay in seconds between requests issued by one worker
    #[serde(rename = "rate-limit-delay")]
    pub rate_limit_delay: f64,

    /// Maximum number of simultaneous in-flight page fetches
    #[serde(rename = "concurrent-batches")]
    pub concurrent_batches: u32,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-seconds")]
    pub timeout_seconds: u64,

    /// Number of retries after a failed fetch (total attempts = retries + 1)
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 1000,
            rate_limit_delay: 2.0,
            concurrent_batches: 10,
            timeout_seconds: 30,
            max_retries: 3,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the full User-Agent string: `Name/Version (+ContactURL; Email)`
    pub fn user_agent_string(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "Pagefinder".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/pagefinder/pagefinder".to_string(),
            contact_email: "crawler@pagefinder.dev".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path the JSON results report is written to
    #[serde(rename = "results-path")]
    pub results_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_path: "./pagefinder-results.json".to_string(),
        }
    }
}
