//! Parsed-document abstraction used by the pagination detectors
//!
//! Detection operates on a small capability surface (`links()` and
//! `text()`) rather than on raw markup, so every detector stays a pure
//! function and tests can drive them with synthetic documents instead of
//! HTML fixtures.

use scraper::{Html, Selector};
use url::Url;

/// A single anchor extracted from a page, resolved to absolute form
#[derive(Debug, Clone)]
pub struct PageLink {
    /// Absolute URL the anchor points at
    pub url: Url,

    /// Trimmed anchor text
    pub text: String,

    /// Value of the `rel` attribute, if any
    pub rel: Option<String>,
}

/// Capability interface the detectors consume
pub trait DocumentView {
    /// All same-document anchors, resolved to absolute HTTP(S) URLs
    fn links(&self) -> &[PageLink];

    /// The visible text of the page, whitespace-collapsed
    fn text(&self) -> &str;
}

/// A `DocumentView` backed by a parsed HTML document
#[derive(Debug)]
pub struct HtmlDocument {
    links: Vec<PageLink>,
    text: String,
}

impl HtmlDocument {
    /// Parses HTML content into the link/text view the detectors need
    ///
    /// Anchors are resolved against `base_url`; javascript:/mailto:/tel:/
    /// data: schemes, fragment-only hrefs, and anything that does not
    /// resolve to HTTP(S) are dropped.
    ///
    /// # Arguments
    ///
    /// * `html` - The HTML content to parse
    /// * `base_url` - The base URL for resolving relative links
    pub fn parse(html: &str, base_url: &Url) -> Self {
        let document = Html::parse_document(html);

        let mut links = Vec::new();
        if let Ok(selector) = Selector::parse("a[href]") {
            for element in document.select(&selector) {
                let Some(href) = element.value().attr("href") else {
                    continue;
                };
                let Some(url) = resolve_link(href, base_url) else {
                    continue;
                };

                let text = element
                    .text()
                    .collect::<String>()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ");
                let rel = element.value().attr("rel").map(|r| r.to_lowercase());

                links.push(PageLink { url, text, rel });
            }
        }

        let text = document
            .root_element()
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        Self { links, text }
    }
}

impl DocumentView for HtmlDocument {
    fn links(&self) -> &[PageLink] {
        &self.links
    }

    fn text(&self) -> &str {
        &self.text
    }
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel:, data: schemes
/// - fragment-only hrefs (same page anchors)
/// - anything that does not resolve to HTTP(S)
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url),
        _ => None,
    }
}
