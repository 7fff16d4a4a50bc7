//! URL parsing and resolution against a comic's origin page.

use url::Url;

/// Error type for URL parsing failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Parse a configured origin URL.
///
/// Trims whitespace, defaults the scheme to https, only accepts http(s) and
/// drops the fragment. The query string is kept as is.
pub fn canonicalize(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let mut parsed = Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Resolve `href` against `origin` with standard relative-URL rules.
///
/// Protocol-relative references (`//host/path`) take the origin's scheme.
pub fn resolve(origin: &Url, href: &str) -> Result<Url, UrlError> {
    let trimmed = href.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }
    origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))
}

/// Best-effort [`resolve`]: unresolvable input is returned unchanged.
pub fn fix_url(origin: &Url, href: &str) -> String {
    match resolve(origin, href) {
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::debug!(href, error = %e, "leaving unresolvable URL as is");
            href.to_string()
        }
    }
}

/// Resolve the URL token of every `srcset` candidate.
///
/// Candidates are comma separated `url [descriptor]` pairs; descriptors are
/// kept verbatim.
pub fn fix_srcset(origin: &Url, srcset: &str) -> String {
    srcset
        .split(',')
        .map(|candidate| {
            let mut parts: Vec<String> = candidate.split(' ').filter(|s| !s.is_empty()).map(String::from).collect();
            if let Some(first) = parts.first_mut() {
                *first = fix_url(origin, first);
            }
            parts.join(" ")
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://www.example.com/comics/today").unwrap()
    }

    #[test]
    fn test_canonicalize_default_scheme() {
        let url = canonicalize("example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_canonicalize_keeps_query_drops_fragment() {
        let url = canonicalize("  https://www.monkeyuser.com/?dir=last#top ").unwrap();
        assert_eq!(url.query(), Some("dir=last"));
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_canonicalize_rejects_other_schemes() {
        assert!(matches!(canonicalize("file:///etc/passwd"), Err(UrlError::UnsupportedScheme(_))));
        assert!(matches!(canonicalize("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_fix_url_relative() {
        assert_eq!(fix_url(&origin(), "strip.png"), "https://www.example.com/comics/strip.png");
        assert_eq!(fix_url(&origin(), "/img/strip.png"), "https://www.example.com/img/strip.png");
        assert_eq!(fix_url(&origin(), "../strip.png"), "https://www.example.com/strip.png");
    }

    #[test]
    fn test_fix_url_protocol_relative_takes_origin_scheme() {
        assert_eq!(fix_url(&origin(), "//cdn.example.net/a.png"), "https://cdn.example.net/a.png");

        let http_origin = Url::parse("http://example.com/").unwrap();
        assert_eq!(fix_url(&http_origin, "//cdn.example.net/a.png"), "http://cdn.example.net/a.png");
    }

    #[test]
    fn test_fix_url_idempotent() {
        for href in ["strip.png", "//cdn.example.net/a b.png", "/x?y=1", "https://other.org/Z.gif"] {
            let once = fix_url(&origin(), href);
            let twice = fix_url(&origin(), &once);
            assert_eq!(once, twice, "href {href}");
        }
    }

    #[test]
    fn test_fix_url_unresolvable_is_unchanged() {
        assert_eq!(fix_url(&origin(), ""), "");
        assert_eq!(fix_url(&origin(), "http://[::1"), "http://[::1");
    }

    #[test]
    fn test_fix_srcset_rewrites_only_urls() {
        let fixed = fix_srcset(&origin(), "small.png 1x, //cdn.example.net/big.png 2x");
        assert_eq!(fixed, "https://www.example.com/comics/small.png 1x,https://cdn.example.net/big.png 2x");
    }

    #[test]
    fn test_fix_srcset_without_descriptor() {
        let fixed = fix_srcset(&origin(), "/a.png");
        assert_eq!(fixed, "https://www.example.com/a.png");
    }

    #[test]
    fn test_fix_srcset_width_descriptors() {
        let fixed = fix_srcset(&origin(), "a-400.png 400w,a-800.png   800w");
        assert_eq!(fixed, "https://www.example.com/comics/a-400.png 400w,https://www.example.com/comics/a-800.png 800w");
    }
}
