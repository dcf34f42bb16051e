//! Rewriting of result URLs into their public, stable form.
//!
//! The service exposes every result under two aliases (`/download/` and
//! `/public/`) and, when running behind a development proxy, reports its
//! own loopback origin. Clients must only ever hand out the public alias on
//! the production origin.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::config::PRODUCTION_BASE_URL;

const DOWNLOAD_SEGMENT: &str = "/download/";
const PUBLIC_SEGMENT: &str = "/public/";

static LOOPBACK_ORIGIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://(?:localhost|127\.0\.0\.1)(?::\d+)?").unwrap()
});

/// Normalize a result URL against the production origin.
///
/// Empty input is returned unchanged. The function is idempotent.
pub fn normalize_result_url(url: &str) -> String {
    normalize_with_origin(url, PRODUCTION_BASE_URL)
}

/// Null-safe variant of [`normalize_result_url`].
pub fn normalize_optional(url: Option<&str>) -> Option<String> {
    url.map(normalize_result_url)
}

/// Normalize a result URL, replacing a loopback origin with `origin`.
pub fn normalize_with_origin(url: &str, origin: &str) -> String {
    if url.is_empty() {
        return String::new();
    }

    let mut normalized = replace_loopback_origin(url, origin.trim_end_matches('/'));

    // Segments can overlap ("/download/download/"), so replace one at a
    // time until none is left.
    while let Some(pos) = normalized.find(DOWNLOAD_SEGMENT) {
        normalized.replace_range(pos..pos + DOWNLOAD_SEGMENT.len(), PUBLIC_SEGMENT);
    }

    normalized
}

fn replace_loopback_origin(url: &str, origin: &str) -> String {
    if let Some(m) = LOOPBACK_ORIGIN.find(url) {
        let rest = &url[m.end()..];
        // "http://localhost.example.com" is not a loopback origin
        if rest.is_empty() || rest.starts_with(['/', '?', '#']) {
            return format!("{origin}{rest}");
        }
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_download_replaced_with_public() {
        assert_eq!(
            normalize_result_url("https://convertease.site/download/file.pdf"),
            "https://convertease.site/public/file.pdf"
        );
    }

    #[test]
    fn test_localhost_and_download_rewritten() {
        assert_eq!(
            normalize_result_url("http://localhost:8000/download/a.pdf"),
            format!("{PRODUCTION_BASE_URL}/public/a.pdf")
        );
    }

    #[test]
    fn test_loopback_variants() {
        for url in [
            "http://127.0.0.1:8000/public/file.pdf",
            "http://localhost/public/file.pdf",
            "https://localhost:8443/public/file.pdf",
            "HTTP://LOCALHOST:3000/public/file.pdf",
        ] {
            assert_eq!(
                normalize_result_url(url),
                "https://convertease.site/public/file.pdf",
                "input: {url}"
            );
        }
    }

    #[test]
    fn test_path_preserved_when_only_host_changes() {
        assert_eq!(
            normalize_result_url("http://localhost:3000/api/file.pdf?x=1"),
            "https://convertease.site/api/file.pdf?x=1"
        );
    }

    #[test]
    fn test_non_loopback_host_untouched() {
        let url = "https://cdn.example.com/public/file.pdf";
        assert_eq!(normalize_result_url(url), url);
        let url = "http://localhost.example.com/public/file.pdf";
        assert_eq!(normalize_result_url(url), url);
    }

    #[test]
    fn test_empty_and_missing_input() {
        assert_eq!(normalize_result_url(""), "");
        assert_eq!(normalize_optional(None), None);
        assert_eq!(normalize_optional(Some("")), Some(String::new()));
    }

    #[test]
    fn test_repeated_download_segments() {
        let once = normalize_result_url("https://x/download/download/a");
        assert_eq!(once, "https://x/public/public/a");
        assert_eq!(normalize_result_url(&once), once);
    }

    #[test]
    fn test_custom_origin() {
        assert_eq!(
            normalize_with_origin("http://127.0.0.1/download/a.mp3", "https://staging.site/"),
            "https://staging.site/public/a.mp3"
        );
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(url in ".{0,80}") {
            let once = normalize_result_url(&url);
            prop_assert_eq!(normalize_result_url(&once), once);
        }

        #[test]
        fn prop_normalize_is_idempotent_for_url_shapes(
            scheme in "(http|https|HTTP)",
            host in "(localhost|127\\.0\\.0\\.1|example\\.com|localhost\\.dev)",
            port in proptest::option::of(1u16..65535),
            path in "(/(download|public|a|b\\.pdf)){0,4}/?",
        ) {
            let port = port.map(|p| format!(":{p}")).unwrap_or_default();
            let url = format!("{scheme}://{host}{port}{path}");
            let once = normalize_result_url(&url);
            prop_assert_eq!(normalize_result_url(&once), once.clone());
            prop_assert!(!once.contains("/download/"));
        }
    }
}
