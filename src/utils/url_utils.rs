//! URL helpers shared by the acquisition strategies

use url::Url;

/// Check if a URL is a fetchable http(s) URL
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    // Skip data URLs, javascript URLs, and other non-http schemes
    if url.starts_with("data:") || url.starts_with("javascript:") || url.starts_with("mailto:") {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Resolve a possibly relative reference against `base`.
///
/// Protocol-relative (`//host/path`) and absolute references are handled by
/// the URL joiner; `None` when the result is not an http(s) URL.
#[must_use]
pub fn resolve_url(base: &str, reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() || reference == "#" {
        return None;
    }

    let resolved = match Url::parse(reference) {
        Ok(absolute) => absolute,
        Err(_) => Url::parse(base).ok()?.join(reference).ok()?,
    };

    is_valid_url(resolved.as_str()).then(|| resolved.to_string())
}

/// `scheme://host[:port]` of a URL, used as the Referer of follow-up requests
#[must_use]
pub fn origin(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let origin = parsed.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_references_resolve_against_base() {
        assert_eq!(
            resolve_url("https://example.org/fr/classement", "export.csv").as_deref(),
            Some("https://example.org/fr/export.csv")
        );
        assert_eq!(
            resolve_url("https://example.org/fr/classement", "//cdn.example.org/a.csv").as_deref(),
            Some("https://cdn.example.org/a.csv")
        );
    }

    #[test]
    fn non_http_references_are_rejected() {
        assert_eq!(resolve_url("https://example.org/", "javascript:void(0)"), None);
        assert_eq!(resolve_url("https://example.org/", "#"), None);
        assert!(!is_valid_url("mailto:someone@example.org"));
    }

    #[test]
    fn origin_drops_path_and_query() {
        assert_eq!(
            origin("https://www.example.org:8443/a/b?c=d").as_deref(),
            Some("https://www.example.org:8443")
        );
    }
}
