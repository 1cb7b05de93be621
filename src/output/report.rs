//! JSON report generation
//!
//! The report is the machine-readable record of a discovery run: what was
//! detected, how the crawl was configured, every URL found, and every page
//! that failed. Downstream consumers read this file; nothing in the crawl
//! itself depends on it.

use crate::config::CrawlConfig;
use crate::crawler::{Discovery, FailedPage};
use crate::detect::DetectionResult;
use crate::strategy::CrawlStrategy;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// The serialized shape of one discovery run
#[derive(Debug, Serialize)]
pub struct CrawlReport<'a> {
    /// When the report was written
    pub generated_at: DateTime<Utc>,

    /// The seed URL the run started from
    pub seed_url: &'a str,

    /// The crawl tuning that was in effect
    pub config: &'a CrawlConfig,

    /// Hash of the config file, when one was loaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<&'a str>,

    /// The pagination classification of the seed page
    pub detection: &'a DetectionResult,

    /// The strategy that drove the crawl, absent for single-page runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<&'a CrawlStrategy>,

    pub total_pages_attempted: u32,
    pub total_pages_succeeded: u32,
    pub cancelled: bool,
    pub elapsed_seconds: f64,

    /// Discovered content URLs, sorted for stable output
    pub urls: Vec<&'a str>,

    /// Pages that never succeeded, in worklist order
    pub failed_pages: &'a [FailedPage],
}

impl<'a> CrawlReport<'a> {
    /// Builds a report from a finished discovery run
    pub fn from_discovery(
        discovery: &'a Discovery,
        config: &'a CrawlConfig,
        config_hash: Option<&'a str>,
    ) -> Self {
        let mut urls: Vec<&str> = discovery
            .result
            .deduplicated_urls
            .iter()
            .map(String::as_str)
            .collect();
        urls.sort_unstable();

        Self {
            generated_at: Utc::now(),
            seed_url: &discovery.seed_url,
            config,
            config_hash,
            detection: &discovery.detection,
            strategy: discovery.strategy.as_ref(),
            total_pages_attempted: discovery.result.total_pages_attempted,
            total_pages_succeeded: discovery.result.total_pages_succeeded,
            cancelled: discovery.result.cancelled,
            elapsed_seconds: discovery.result.elapsed_seconds,
            urls,
            failed_pages: &discovery.result.failed_pages,
        }
    }
}

/// Writes a report as pretty-printed JSON
///
/// # Arguments
///
/// * `path` - Destination file path (overwritten if present)
/// * `report` - The report to serialize
pub fn write_json_report(path: &Path, report: &CrawlReport<'_>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    tracing::info!("Report written to {}", path.display());
    Ok(())
}
