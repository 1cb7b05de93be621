//! Crawl strategy selection
//!
//! Maps a [`DetectionResult`] onto one of a fixed set of page-URL
//! generation strategies and binds its parameters. Selection is
//! deterministic and fails only for a `None` detection, in which case the
//! caller should treat the seed page as the sole page.

use crate::detect::{DetectionResult, PaginationType, LIMIT_PARAM_KEYS};
use crate::{PageFinderError, Result};
use serde::Serialize;
use url::Url;

/// Substitution point in a strategy's URL template
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Page size assumed for offset strategies when none was observed
const DEFAULT_ITEMS_PER_PAGE: u64 = 20;

/// How a strategy produces page URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Substitute a page number into the template
    ParameterBased,
    /// Substitute an item offset into the template
    OffsetBased,
    /// Follow each page's own next link; no template substitution
    LinkBased,
    /// Conventional `?page=N` guess derived from a text-only indicator;
    /// abandoned early if it yields nothing
    IndicatorBased,
}

/// A parameterized page-URL generation strategy
///
/// Derived from a detection result, consumed by the orchestrator. For the
/// templated kinds the full URL list is computable up front; for
/// [`StrategyKind::LinkBased`] the template holds the chain's starting URL
/// and each next URL is re-resolved from the fetched page.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlStrategy {
    /// How page URLs are generated
    pub kind: StrategyKind,

    /// URL with a single `{page}` substitution point (templated kinds), or
    /// the chain starting URL (link-based)
    pub url_template: String,

    /// Value substituted for the first page (page number or offset)
    pub start_index: u64,

    /// Increment between consecutive substituted values
    pub step: u64,

    /// Number of pages this strategy expects to exist; the orchestrator
    /// additionally bounds the crawl by its own configured ceiling
    pub max_pages: u32,
}

impl CrawlStrategy {
    /// Builds the URL for the page at the given worklist position
    ///
    /// Position 0 is the first page; the substituted value is
    /// `start_index + position * step`.
    pub fn page_url(&self, position: u32) -> String {
        let value = self.start_index + u64::from(position) * self.step;
        self.url_template.replace(PAGE_PLACEHOLDER, &value.to_string())
    }

    /// Whether the full page-URL list is known up front
    pub fn is_templated(&self) -> bool {
        self.kind != StrategyKind::LinkBased
    }
}

/// Selects and parameterizes a crawl strategy from a detection result
///
/// # Errors
///
/// [`PageFinderError::UnsupportedPagination`] when the detection classified
/// the seed as having no pagination; every other classification maps to a
/// strategy.
pub fn select(detection: &DetectionResult) -> Result<CrawlStrategy> {
    let max_pages = estimate_max_pages(detection);

    let strategy = match detection.pagination_type {
        PaginationType::None => {
            return Err(PageFinderError::UnsupportedPagination {
                base_url: detection.base_url.clone(),
                pagination_type: detection.pagination_type,
            })
        }
        PaginationType::ParameterBased => {
            let name = detection.page_parameter_name.as_deref().unwrap_or("page");
            CrawlStrategy {
                kind: StrategyKind::ParameterBased,
                url_template: build_template(&detection.base_url, name),
                start_index: 1,
                step: 1,
                max_pages,
            }
        }
        PaginationType::OffsetBased => {
            let name = detection.page_parameter_name.as_deref().unwrap_or("offset");
            CrawlStrategy {
                kind: StrategyKind::OffsetBased,
                url_template: build_template(&detection.base_url, name),
                start_index: 0,
                step: infer_step(detection, name),
                max_pages,
            }
        }
        PaginationType::LinkBased => CrawlStrategy {
            kind: StrategyKind::LinkBased,
            url_template: detection.base_url.clone(),
            start_index: 0,
            step: 1,
            max_pages,
        },
        PaginationType::IndicatorBased => CrawlStrategy {
            kind: StrategyKind::IndicatorBased,
            url_template: build_template(&detection.base_url, "page"),
            start_index: 1,
            step: 1,
            max_pages,
        },
    };

    tracing::debug!(
        "Selected {:?} strategy: {} pages from {}",
        strategy.kind,
        strategy.max_pages,
        strategy.url_template
    );

    Ok(strategy)
}

/// Appends the pagination parameter with the `{page}` placeholder
fn build_template(base_url: &str, param_name: &str) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{separator}{param_name}={PAGE_PLACEHOLDER}")
}

/// Page-count estimate when the detector could not pin one down, scaled by
/// how much we trust the classification
fn estimate_max_pages(detection: &DetectionResult) -> u32 {
    if let Some(total) = detection.total_pages {
        return total.max(1);
    }
    if detection.confidence > 0.7 {
        100
    } else if detection.confidence > 0.4 {
        50
    } else {
        20
    }
}

/// Derives the offset step from the observed sample page links
///
/// An observed `limit`-family value wins; otherwise the smallest positive
/// gap between observed offsets; otherwise the conventional default.
fn infer_step(detection: &DetectionResult, offset_param: &str) -> u64 {
    let mut offsets: Vec<u64> = Vec::new();

    for sample in &detection.sample_page_urls {
        let Ok(url) = Url::parse(sample) else {
            continue;
        };
        for (key, value) in url.query_pairs() {
            let Ok(number) = value.parse::<u64>() else {
                continue;
            };
            if LIMIT_PARAM_KEYS.contains(&key.as_ref()) && number > 0 {
                return number;
            }
            if key == offset_param {
                offsets.push(number);
            }
        }
    }

    offsets.sort_unstable();
    offsets.dedup();
    offsets
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|gap| *gap > 0)
        .min()
        .unwrap_or(DEFAULT_ITEMS_PER_PAGE)
}
