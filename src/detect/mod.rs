//! Pagination detection engine
//!
//! Classifies how a seed page paginates its listing by running four
//! independent detectors over a parsed-document view and keeping the
//! highest-confidence result:
//!
//! 1. Parameter-based (`?page=N` and friends, including `/page/N` paths)
//! 2. Offset-based (`?offset=N&limit=M` and friends)
//! 3. Link-based (next/previous anchors with no numeric pattern)
//! 4. Indicator-based ("Page N of M" text with nothing navigable)
//!
//! Detection never fails: ambiguous or malformed input yields a
//! [`PaginationType::None`] result with confidence 0, so callers always get
//! a decision.

mod document;
mod indicator;
mod navigation;
mod parameter;

pub use document::{DocumentView, HtmlDocument, PageLink};
pub use navigation::find_next_url;

use crate::crawler::extractor::extract_content_urls;
use serde::Serialize;
use url::Url;

/// Query parameter names that carry a page number
pub(crate) const PAGE_PARAM_KEYS: &[&str] = &["page", "p", "pg", "pageno"];

/// Query parameter names that carry an item offset
pub(crate) const OFFSET_PARAM_KEYS: &[&str] = &["offset", "start", "skip", "from"];

/// Query parameter names that carry a page size
pub(crate) const LIMIT_PARAM_KEYS: &[&str] = &["limit", "per_page", "page_size", "items_per_page"];

/// Maximum number of observed page links kept as classification evidence
pub(crate) const MAX_SAMPLE_PAGE_URLS: usize = 10;

/// The mechanism a site uses to split a listing across multiple pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationType {
    /// No pagination signals found; the seed is the only page
    None,
    /// Query-string page number, e.g. `?page=3`
    ParameterBased,
    /// Item offset plus page size, e.g. `?offset=40&limit=20`
    OffsetBased,
    /// Explicit next/previous anchors without a numeric pattern
    LinkBased,
    /// "Page X of Y" style text only, nothing navigable
    IndicatorBased,
}

impl std::fmt::Display for PaginationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::ParameterBased => "parameter_based",
            Self::OffsetBased => "offset_based",
            Self::LinkBased => "link_based",
            Self::IndicatorBased => "indicator_based",
        };
        write!(f, "{}", name)
    }
}

/// The outcome of inspecting a seed page for pagination
///
/// A value object: built once by [`detect`], then passed around by copy.
/// When `pagination_type` is [`PaginationType::None`], `confidence` is 0
/// and `total_pages` is absent.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    /// How the site paginates
    pub pagination_type: PaginationType,

    /// Classification certainty in [0, 1]
    pub confidence: f64,

    /// Estimated number of listing pages, when one could be inferred
    pub total_pages: Option<u32>,

    /// Estimated number of listed items, when one could be inferred
    pub total_items: Option<u64>,

    /// Name of the pagination query parameter (e.g. `"page"`, `"offset"`)
    pub page_parameter_name: Option<String>,

    /// The seed URL with pagination parameters stripped
    pub base_url: String,

    /// Observed page links backing the classification, at most
    /// [`MAX_SAMPLE_PAGE_URLS`] of them, in ascending page order
    pub sample_page_urls: Vec<String>,
}

impl DetectionResult {
    /// The terminal "no pagination" result for a seed
    pub fn none(base_url: String) -> Self {
        Self {
            pagination_type: PaginationType::None,
            confidence: 0.0,
            total_pages: None,
            total_items: None,
            page_parameter_name: None,
            base_url,
            sample_page_urls: Vec::new(),
        }
    }
}

/// Inspects a seed page and classifies its pagination scheme
///
/// Runs all detectors and keeps the highest-confidence non-`None` result;
/// ties go to the earlier detector, since structured URL signals are more
/// reliable than textual ones. Never fails: malformed input produces a
/// `None` classification with confidence 0.
///
/// # Arguments
///
/// * `seed_url` - The listing URL that was fetched
/// * `html` - The seed page's body
///
/// # Examples
///
/// ```
/// use pagefinder::detect::{detect, PaginationType};
///
/// let html = r#"<a href="?page=1">1</a> <a href="?page=2">2</a>
///               <a href="?page=3">3</a>"#;
/// let result = detect("https://example.gov/news?page=1", html);
/// assert_eq!(result.pagination_type, PaginationType::ParameterBased);
/// ```
pub fn detect(seed_url: &str, html: &str) -> DetectionResult {
    let Ok(seed) = Url::parse(seed_url) else {
        tracing::debug!("Seed URL failed to parse, classifying as none: {}", seed_url);
        return DetectionResult::none(seed_url.to_string());
    };

    let base_url = strip_pagination_params(&seed);
    let doc = HtmlDocument::parse(html, &seed);

    // Priority order doubles as the tie-break: a later detector must be
    // strictly more confident to displace an earlier one.
    let candidates = [
        parameter::detect_parameter(&seed, &doc, &base_url),
        parameter::detect_offset(&seed, &doc, &base_url),
        navigation::detect_navigation(&doc, &base_url),
        indicator::detect_indicator(&doc, &base_url),
    ];

    let mut winner: Option<DetectionResult> = None;
    for candidate in candidates.into_iter().flatten() {
        let replace = match &winner {
            Some(current) => candidate.confidence > current.confidence,
            None => true,
        };
        if replace {
            winner = Some(candidate);
        }
    }

    let Some(mut result) = winner else {
        return DetectionResult::none(base_url);
    };

    // A known item count with no page count still pins down the page range
    // if the seed page tells us how many items one page holds.
    if result.total_pages.is_none() {
        if let Some(total_items) = result.total_items {
            let items_per_page = extract_content_urls(html, &seed).len() as u64;
            if items_per_page > 0 {
                result.total_pages = Some(total_items.div_ceil(items_per_page) as u32);
            }
        }
    }

    tracing::debug!(
        "Detected {} (confidence {:.2}, total_pages {:?}) for {}",
        result.pagination_type,
        result.confidence,
        result.total_pages,
        seed_url
    );

    result
}

/// Removes known pagination parameters from a URL, yielding the base the
/// crawl strategies template against
fn strip_pagination_params(url: &Url) -> String {
    let mut base = url.clone();
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| {
            let key = key.as_ref();
            !PAGE_PARAM_KEYS.contains(&key)
                && !OFFSET_PARAM_KEYS.contains(&key)
                && !LIMIT_PARAM_KEYS.contains(&key)
        })
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    if kept.is_empty() {
        base.set_query(None);
    } else {
        let query = kept
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        base.set_query(Some(&query));
    }
    base.set_fragment(None);
    base.to_string()
}
