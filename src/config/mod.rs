//! Configuration module for pagefinder
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every field has a default, so the crawler can run without a
//! config file at all; validation is fail-fast and happens before any
//! network activity.
//!
//! # Example
//!
//! ```no_run
//! use pagefinder::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("pagefinder.toml")).unwrap();
//! println!("Crawling at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};

// Re-export validation (used directly when a config is built in code)
pub use validation::{validate, validate_crawl_config};
