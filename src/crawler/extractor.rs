//! Content-URL extraction
//!
//! Pulls the links that point at actual content items (articles, documents,
//! stories) out of a listing page, as opposed to links that navigate the
//! listing itself. The same rule serves the orchestrator on every fetched
//! page and the detector when it sizes a page by its content-link count.

use crate::detect::{
    DocumentView, HtmlDocument, OFFSET_PARAM_KEYS, PAGE_PARAM_KEYS,
};
use crate::url::same_host;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Path fragments that strongly suggest a content item
const CONTENT_PATH_MARKERS: &[&str] = &[
    "/news/",
    "/article/",
    "/articles/",
    "/blog/",
    "/post/",
    "/posts/",
    "/story/",
    "/stories/",
    "/publications/",
    "/announcements/",
    "/speeches/",
    "/statements/",
    "/government/",
];

/// Path fragments that are never content items
const NON_CONTENT_PATH_MARKERS: &[&str] = &[
    "/search",
    "/admin",
    "/login",
    "/register",
    "/contact",
    "/about",
    "/privacy",
    "/terms",
    "/sitemap",
    "/rss",
    "/feed",
    "/api/",
    "/help",
    "/support",
    "/faq",
    "/cookies",
    "/accessibility",
];

/// Extracts content URLs from a page body
///
/// A link qualifies when it stays on the listing's host, is not itself a
/// pagination link, and its path looks like a content item (known content
/// markers, a dated path, or enough path depth). Returns absolute URL
/// strings in first-seen order, without duplicates.
pub fn extract_content_urls(html: &str, page_url: &Url) -> Vec<String> {
    let doc = HtmlDocument::parse(html, page_url);
    content_urls_from_doc(&doc, page_url)
}

fn content_urls_from_doc<D: DocumentView>(doc: &D, page_url: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for link in doc.links() {
        if !same_host(page_url, &link.url) {
            continue;
        }
        if is_pagination_link(&link.url) {
            continue;
        }
        if !is_content_path(link.url.path()) {
            continue;
        }
        let url = link.url.to_string();
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }

    urls
}

/// Whether a URL navigates the listing rather than pointing at content
fn is_pagination_link(url: &Url) -> bool {
    url.query_pairs().any(|(key, _)| {
        let key = key.to_lowercase();
        PAGE_PARAM_KEYS.contains(&key.as_str()) || OFFSET_PARAM_KEYS.contains(&key.as_str())
    })
}

/// Classifies a path as content or not
///
/// Ordering matters: known content markers win outright, known non-content
/// markers veto, then dated paths and path depth decide the remainder.
fn is_content_path(path: &str) -> bool {
    let path_lower = path.to_lowercase();

    if path_lower.is_empty() || path_lower == "/" {
        return false;
    }

    if CONTENT_PATH_MARKERS
        .iter()
        .any(|marker| path_lower.contains(marker))
    {
        return true;
    }

    if NON_CONTENT_PATH_MARKERS
        .iter()
        .any(|marker| path_lower.contains(marker))
    {
        return false;
    }

    // Dated paths (/2024/06/03/..., /2024/06/...) are almost always articles
    if let Ok(re) = Regex::new(r"/\d{4}/\d{2}(/\d{2})?/") {
        if re.is_match(&path_lower) {
            return true;
        }
    }

    // Deep paths tend to be items; shallow ones tend to be sections
    path_lower.split('/').filter(|s| !s.is_empty()).count() >= 3
}
