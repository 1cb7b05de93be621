//! Human-readable run summary
//!
//! Printed to stdout at the end of a CLI run; tracing handles everything
//! in between.

use crate::crawler::Discovery;

/// Estimates total crawl time in seconds for a page count and pacing
///
/// Batches run sequentially; each batch costs roughly half a second per
/// page of fetch time plus the configured inter-batch delay.
pub fn estimate_crawl_time(total_pages: u32, rate_limit_delay: f64, concurrent_batches: u32) -> f64 {
    if total_pages == 0 || concurrent_batches == 0 {
        return 0.0;
    }
    let total_batches = total_pages.div_ceil(concurrent_batches);
    let time_per_batch = f64::from(concurrent_batches) * 0.5 + rate_limit_delay;
    f64::from(total_batches) * time_per_batch
}

/// Prints the end-of-run summary
pub fn print_summary(discovery: &Discovery) {
    let result = &discovery.result;

    println!("=== Discovery Summary ===\n");
    println!("Seed URL: {}", discovery.seed_url);
    println!(
        "Pagination: {} (confidence {:.2})",
        discovery.detection.pagination_type, discovery.detection.confidence
    );
    if let Some(total) = discovery.detection.total_pages {
        println!("Detected total pages: {}", total);
    }
    if let Some(items) = discovery.detection.total_items {
        println!("Detected total items: {}", items);
    }
    if let Some(strategy) = &discovery.strategy {
        println!("Strategy: {:?} over {}", strategy.kind, strategy.url_template);
    } else {
        println!("Strategy: single page (no pagination)");
    }

    println!();
    println!(
        "Pages: {} attempted, {} succeeded, {} failed",
        result.total_pages_attempted,
        result.total_pages_succeeded,
        result.failed_pages.len()
    );
    println!("Content URLs found: {}", result.deduplicated_urls.len());
    println!("Elapsed: {:.1}s", result.elapsed_seconds);

    if result.cancelled {
        println!("\n! Crawl was cancelled; results are partial");
    }

    if !result.failed_pages.is_empty() {
        println!("\nFailed pages:");
        for failed in result.failed_pages.iter().take(5) {
            println!(
                "  - page {} ({}): {}",
                failed.page_index, failed.page_url, failed.error
            );
        }
        if result.failed_pages.len() > 5 {
            println!("  - ... and {} more", result.failed_pages.len() - 5);
        }
    }
}
