//! Parameter- and offset-based pagination detectors
//!
//! Both detectors scan the same evidence: numeric query values observed on
//! same-host anchors plus the seed URL's own query string. Confidence
//! scales with the number of distinct consistent values seen, since three
//! observed page numbers are far stronger evidence than one.

use super::navigation::is_next_link;
use super::{
    DetectionResult, DocumentView, PaginationType, LIMIT_PARAM_KEYS, MAX_SAMPLE_PAGE_URLS,
    OFFSET_PARAM_KEYS, PAGE_PARAM_KEYS,
};
use crate::url::same_host;
use regex::Regex;
use std::collections::BTreeMap;
use url::Url;

/// Numeric values observed for one query parameter name
#[derive(Debug, Default)]
struct ParamEvidence {
    /// value -> example URL carrying it (BTreeMap keeps page order)
    values: BTreeMap<u64, String>,

    /// Whether any carrying anchor had next-link semantics
    behind_next_link: bool,

    /// Whether the seed URL itself carries this parameter
    on_seed: bool,
}

impl ParamEvidence {
    fn distinct(&self) -> usize {
        self.values.len()
    }

    fn max_value(&self) -> Option<u64> {
        self.values.keys().next_back().copied()
    }

    fn sample_urls(&self) -> Vec<String> {
        self.values
            .values()
            .take(MAX_SAMPLE_PAGE_URLS)
            .cloned()
            .collect()
    }
}

/// Collects numeric query evidence from same-host anchors and the seed URL
fn collect_evidence<D: DocumentView>(seed: &Url, doc: &D) -> BTreeMap<String, ParamEvidence> {
    let mut evidence: BTreeMap<String, ParamEvidence> = BTreeMap::new();

    for link in doc.links() {
        if !same_host(seed, &link.url) {
            continue;
        }
        let next_like = is_next_link(link);
        for (key, value) in link.url.query_pairs() {
            let Ok(number) = value.parse::<u64>() else {
                continue;
            };
            let entry = evidence.entry(key.to_lowercase()).or_default();
            entry
                .values
                .entry(number)
                .or_insert_with(|| link.url.to_string());
            entry.behind_next_link |= next_like;
        }

        // Path-segment pagination (/page/3, /page-3) counts as evidence for
        // the conventional "page" parameter.
        if let Some(number) = path_page_number(&link.url) {
            let entry = evidence.entry("page".to_string()).or_default();
            entry
                .values
                .entry(number)
                .or_insert_with(|| link.url.to_string());
            entry.behind_next_link |= next_like;
        }
    }

    for (key, value) in seed.query_pairs() {
        if let Ok(number) = value.parse::<u64>() {
            let entry = evidence.entry(key.to_lowercase()).or_default();
            entry
                .values
                .entry(number)
                .or_insert_with(|| seed.to_string());
            entry.on_seed = true;
        }
    }

    evidence
}

/// Extracts a page number from path-style pagination segments
fn path_page_number(url: &Url) -> Option<u64> {
    let re = Regex::new(r"/(?:page|pg|p)[/-](\d+)(?:/|$)").ok()?;
    let captures = re.captures(url.path())?;
    captures.get(1)?.as_str().parse().ok()
}

/// Scores distinct-value evidence on the shared confidence ladder
///
/// Three or more consistent values are strong structural evidence; two are
/// suggestive; a single value only counts when something else vouches for
/// it (a next-style anchor, or the seed URL itself carrying the parameter).
fn score(evidence: &ParamEvidence) -> Option<f64> {
    match evidence.distinct() {
        0 => None,
        1 => {
            if evidence.behind_next_link || evidence.on_seed {
                Some(0.3)
            } else {
                None
            }
        }
        2 => Some(0.5),
        n => Some((0.8 + 0.05 * (n as f64 - 3.0)).min(0.95)),
    }
}

/// Detects query-parameter pagination (`?page=N` and friends)
pub(super) fn detect_parameter<D: DocumentView>(
    seed: &Url,
    doc: &D,
    base_url: &str,
) -> Option<DetectionResult> {
    let evidence = collect_evidence(seed, doc);

    // Prefer well-known page keys; fall back to any other key whose values
    // form an arithmetic sequence across at least three observed links.
    let (name, chosen) = PAGE_PARAM_KEYS
        .iter()
        .filter_map(|key| evidence.get_key_value(*key))
        .max_by_key(|(_, e)| e.distinct())
        .or_else(|| {
            evidence
                .iter()
                .filter(|(key, e)| {
                    !PAGE_PARAM_KEYS.contains(&key.as_str())
                        && !OFFSET_PARAM_KEYS.contains(&key.as_str())
                        && !LIMIT_PARAM_KEYS.contains(&key.as_str())
                        && e.distinct() >= 3
                        && is_arithmetic(e)
                })
                .max_by_key(|(_, e)| e.distinct())
        })?;

    let confidence = score(chosen)?;

    Some(DetectionResult {
        pagination_type: PaginationType::ParameterBased,
        confidence,
        total_pages: chosen.max_value().map(|v| v.min(u32::MAX as u64) as u32),
        total_items: None,
        page_parameter_name: Some(name.clone()),
        base_url: base_url.to_string(),
        sample_page_urls: chosen.sample_urls(),
    })
}

/// Detects offset pagination (`?offset=N`, usually paired with a limit)
pub(super) fn detect_offset<D: DocumentView>(
    seed: &Url,
    doc: &D,
    base_url: &str,
) -> Option<DetectionResult> {
    let evidence = collect_evidence(seed, doc);

    let (name, chosen) = OFFSET_PARAM_KEYS
        .iter()
        .filter_map(|key| evidence.get_key_value(*key))
        .max_by_key(|(_, e)| e.distinct())?;

    let confidence = score(chosen)?;

    // A sibling limit parameter pins down the page size and therefore the
    // page count the highest observed offset implies.
    let limit = LIMIT_PARAM_KEYS
        .iter()
        .filter_map(|key| evidence.get(*key))
        .filter_map(|e| e.max_value())
        .find(|v| *v > 0);

    let total_pages = match (chosen.max_value(), limit) {
        (Some(max_offset), Some(limit)) => Some((max_offset / limit + 1).min(u32::MAX as u64) as u32),
        _ => None,
    };

    Some(DetectionResult {
        pagination_type: PaginationType::OffsetBased,
        confidence,
        total_pages,
        total_items: None,
        page_parameter_name: Some(name.clone()),
        base_url: base_url.to_string(),
        sample_page_urls: chosen.sample_urls(),
    })
}

/// Checks whether the observed values form an arithmetic sequence
fn is_arithmetic(evidence: &ParamEvidence) -> bool {
    let values: Vec<u64> = evidence.values.keys().copied().collect();
    if values.len() < 3 {
        return false;
    }
    let step = values[1] - values[0];
    step > 0 && values.windows(2).all(|w| w[1] - w[0] == step)
}
