//! URL handling module for pagefinder
//!
//! This module provides the URL normalization used for result
//! deduplication, plus small host helpers shared by the detectors and the
//! content extractor.

mod normalize;

pub use normalize::normalize_url;

use url::Url;

/// Checks whether two URLs point at the same host (case-insensitive)
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(ha), Some(hb)) => ha.eq_ignore_ascii_case(hb),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_host() {
        let a = Url::parse("https://example.com/a").unwrap();
        let b = Url::parse("https://example.com/b?page=2").unwrap();
        let c = Url::parse("https://other.com/a").unwrap();
        assert!(same_host(&a, &b));
        assert!(!same_host(&a, &c));
    }
}
