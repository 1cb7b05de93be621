//! Link-based pagination detection
//!
//! Some sites expose no numeric pattern at all, only next/previous anchors.
//! Detection here is capped at 0.6 confidence because the anchors say
//! nothing about how many pages exist; the crawl must walk them one by one.

use super::{DetectionResult, DocumentView, PageLink, PaginationType, MAX_SAMPLE_PAGE_URLS};
use crate::url::same_host;
use url::Url;

const NEXT_WORDS: &[&str] = &[
    "next",
    "next page",
    "older",
    "older posts",
    "more",
    "more results",
    "»",
    "›",
    "→",
];

const PREV_WORDS: &[&str] = &[
    "previous",
    "previous page",
    "prev",
    "newer",
    "newer posts",
    "«",
    "‹",
    "←",
];

const EDGE_WORDS: &[&str] = &["first", "last", "first page", "last page"];

/// Lowercases anchor text and strips decorative punctuation so that
/// "Next →" and "next" compare equal
fn normalize_text(text: &str) -> String {
    text.trim()
        .trim_matches(|c: char| matches!(c, '.' | ',' | ':' | ';' | '-' | '|' | '>' | '<'))
        .trim()
        .to_lowercase()
}

/// Whether an anchor carries next-page semantics
pub(crate) fn is_next_link(link: &PageLink) -> bool {
    if let Some(rel) = &link.rel {
        if rel.split_whitespace().any(|token| token == "next") {
            return true;
        }
    }
    let text = normalize_text(&link.text);
    NEXT_WORDS.contains(&text.as_str()) || text.starts_with("next ")
}

/// Whether an anchor carries previous-page semantics
pub(crate) fn is_prev_link(link: &PageLink) -> bool {
    if let Some(rel) = &link.rel {
        if rel.split_whitespace().any(|token| token == "prev" || token == "previous") {
            return true;
        }
    }
    let text = normalize_text(&link.text);
    PREV_WORDS.contains(&text.as_str()) || text.starts_with("previous ")
}

/// Whether an anchor points at the first/last page of a listing
fn is_edge_link(link: &PageLink) -> bool {
    EDGE_WORDS.contains(&normalize_text(&link.text).as_str())
}

/// Detects navigation-anchor pagination
///
/// Fires when next or previous anchors are present; a page count is never
/// inferable from them, so confidence tops out at 0.6.
pub(super) fn detect_navigation<D: DocumentView>(
    doc: &D,
    base_url: &str,
) -> Option<DetectionResult> {
    let next: Vec<&PageLink> = doc.links().iter().filter(|l| is_next_link(l)).collect();
    let prev: Vec<&PageLink> = doc.links().iter().filter(|l| is_prev_link(l)).collect();

    if next.is_empty() && prev.is_empty() {
        return None;
    }

    let both_directions = !next.is_empty() && !prev.is_empty();
    let confidence = if both_directions { 0.6 } else { 0.5 };

    let sample_page_urls = next
        .iter()
        .copied()
        .chain(prev.iter().copied())
        .chain(doc.links().iter().filter(|l| is_edge_link(l)))
        .map(|l| l.url.to_string())
        .take(MAX_SAMPLE_PAGE_URLS)
        .collect();

    Some(DetectionResult {
        pagination_type: PaginationType::LinkBased,
        confidence,
        total_pages: None,
        total_items: None,
        page_parameter_name: None,
        base_url: base_url.to_string(),
        sample_page_urls,
    })
}

/// Resolves the next-page URL from a fetched page
///
/// Used by the crawl chain for link-based strategies: `rel="next"` wins,
/// then anchor text. Only same-host targets distinct from the current page
/// qualify, which keeps the chain from wandering off-site or looping in
/// place.
///
/// # Arguments
///
/// * `doc` - The fetched page's parsed view
/// * `current` - The URL the page was fetched from
pub fn find_next_url<D: DocumentView>(doc: &D, current: &Url) -> Option<Url> {
    let candidate = |link: &PageLink| same_host(current, &link.url) && link.url != *current;

    doc.links()
        .iter()
        .find(|l| l.rel.as_deref().is_some_and(|r| r.split_whitespace().any(|t| t == "next")) && candidate(l))
        .or_else(|| {
            doc.links()
                .iter()
                .find(|l| is_next_link(l) && candidate(l))
        })
        .map(|l| l.url.clone())
}
