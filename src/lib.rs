//! Pagefinder: a paginated-listing discovery crawler
//!
//! This crate inspects a seed page to work out how a site paginates its
//! listings, derives a page-URL generation strategy from that classification,
//! and then drives a rate-limited, concurrent, retrying crawl over the
//! discovered page range, collecting a deduplicated set of content URLs.

pub mod config;
pub mod crawler;
pub mod detect;
pub mod output;
pub mod strategy;
pub mod url;

use thiserror::Error;

/// Main error type for pagefinder operations
#[derive(Debug, Error)]
pub enum PageFinderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No usable pagination detected for {base_url} (classified as {pagination_type})")]
    UnsupportedPagination {
        base_url: String,
        pagination_type: detect::PaginationType,
    },

    #[error("Failed to fetch seed page {url}: {message}")]
    SeedFetch { url: String, message: String },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for pagefinder operations
pub type Result<T> = std::result::Result<T, PageFinderError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, CrawlConfig};
pub use crawler::{CancelToken, CrawlResult, Orchestrator, PageStatus};
pub use detect::{detect, DetectionResult, PaginationType};
pub use strategy::{select, CrawlStrategy, StrategyKind};
pub use url::normalize_url;
