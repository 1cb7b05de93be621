//! Indicator-based pagination detection
//!
//! The weakest signal: the page *says* it is paginated ("Page 2 of 48",
//! "1,204 results") but offers nothing navigable. Confidence is capped at
//! 0.4; a crawl from this classification is a conventional `?page=N` guess
//! that gets abandoned quickly if it produces nothing.

use super::{DetectionResult, DocumentView, PaginationType};
use regex::Regex;

/// "Page N of M" and "page N / M" forms; the second capture is the total
const PAGE_OF_PATTERNS: &[&str] = &[
    r"(?i)\bpage\s+(\d+)\s+of\s+([\d,]+)",
    r"(?i)\bpage\s+(\d+)\s*/\s*([\d,]+)",
];

/// "showing A-B of C" forms; captures give the window and the item total
const SHOWING_PATTERN: &str = r"(?i)\bshowing\s+(\d+)\s*[-–]\s*(\d+)\s+of\s+([\d,]+)";

/// Bare result counts: "1,204 results", "88 items"
const RESULT_COUNT_PATTERN: &str = r"(?i)\b([\d,]+)\s+(?:results?|items?|articles?|posts?|entries)\b";

/// Detects text-only pagination indicators
pub(super) fn detect_indicator<D: DocumentView>(
    doc: &D,
    base_url: &str,
) -> Option<DetectionResult> {
    let text = doc.text();

    let mut total_pages: Option<u32> = None;
    let mut total_items: Option<u64> = None;

    for pattern in PAGE_OF_PATTERNS {
        if let Ok(re) = Regex::new(pattern) {
            if let Some(captures) = re.captures(text) {
                total_pages = captures.get(2).and_then(|m| parse_count(m.as_str()));
                break;
            }
        }
    }

    if let Ok(re) = Regex::new(SHOWING_PATTERN) {
        if let Some(captures) = re.captures(text) {
            let first: Option<u64> = captures.get(1).and_then(|m| m.as_str().parse().ok());
            let last: Option<u64> = captures.get(2).and_then(|m| m.as_str().parse().ok());
            total_items = captures.get(3).and_then(|m| parse_count_u64(m.as_str()));

            // The visible window also gives the page size, which pins down
            // the page count when the item total is known.
            if let (Some(first), Some(last), Some(items)) = (first, last, total_items) {
                if last >= first {
                    let per_page = last - first + 1;
                    if total_pages.is_none() && per_page > 0 {
                        total_pages = Some(items.div_ceil(per_page).min(u32::MAX as u64) as u32);
                    }
                }
            }
        }
    }

    if total_items.is_none() {
        if let Ok(re) = Regex::new(RESULT_COUNT_PATTERN) {
            if let Some(captures) = re.captures(text) {
                total_items = captures.get(1).and_then(|m| parse_count_u64(m.as_str()));
            }
        }
    }

    let has_total = total_pages.is_some() || total_items.is_some();

    // A bare "Page N" marker with no total still signals pagination, just
    // more weakly.
    if !has_total {
        let current_page_only = Regex::new(r"(?i)\bpage\s+\d+\b")
            .map(|re| re.is_match(text))
            .unwrap_or(false);
        if !current_page_only {
            return None;
        }
    }

    let confidence = if has_total { 0.4 } else { 0.3 };

    Some(DetectionResult {
        pagination_type: PaginationType::IndicatorBased,
        confidence,
        total_pages,
        total_items,
        page_parameter_name: None,
        base_url: base_url.to_string(),
        sample_page_urls: Vec::new(),
    })
}

/// Parses a count that may contain thousands separators ("1,204")
fn parse_count(s: &str) -> Option<u32> {
    s.replace(',', "").parse().ok()
}

fn parse_count_u64(s: &str) -> Option<u64> {
    s.replace(',', "").parse().ok()
}
