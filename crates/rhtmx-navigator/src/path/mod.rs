/// Path utilities: URI splitting, base-path stripping and segment decoding
///
/// All functions are **pure**: given same input, always produce same output with no side effects.
use std::borrow::Cow;

pub mod validate;

pub use validate::{UrlValidator, ValidationResult};

/// Path and query parts of a navigation target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UriParts<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
}

/// Splits a raw URI into its path and query parts
///
/// - Absolute URIs (`https://host/app?x=1`) lose their scheme and authority
/// - A `#fragment` is dropped
/// - The query is everything after the first `?`, without the `?`
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::path::split_uri;
///
/// let parts = split_uri("https://example.com/users/7?tab=posts#top");
/// assert_eq!(parts.path, "/users/7");
/// assert_eq!(parts.query, Some("tab=posts"));
///
/// let parts = split_uri("/about");
/// assert_eq!(parts.path, "/about");
/// assert_eq!(parts.query, None);
/// ```
pub fn split_uri(uri: &str) -> UriParts<'_> {
    let without_fragment = uri.split_once('#').map_or(uri, |(before, _)| before);
    let relative = strip_authority(without_fragment);

    match relative.split_once('?') {
        Some((path, query)) => UriParts {
            path,
            query: Some(query),
        },
        None => UriParts {
            path: relative,
            query: None,
        },
    }
}

/// `scheme://authority/rest` → `/rest`; anything else is returned unchanged
fn strip_authority(uri: &str) -> &str {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return uri;
    };

    let scheme_like = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !scheme_like {
        return uri;
    }

    match rest.find(['/', '?']) {
        Some(index) => &rest[index..],
        None => "",
    }
}

/// Removes a configured base path prefix (segment-aligned, case-insensitive)
///
/// Returns `None` when the path lives outside the base path.
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::path::strip_base_path;
///
/// assert_eq!(strip_base_path("/app/users", "/app"), Some("/users"));
/// assert_eq!(strip_base_path("/APP", "/app/"), Some(""));
/// assert_eq!(strip_base_path("/application", "/app"), None);
/// assert_eq!(strip_base_path("/users", "/"), Some("/users"));
/// ```
pub fn strip_base_path<'a>(path: &'a str, base: &str) -> Option<&'a str> {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return Some(path);
    }

    let head = path.get(..base.len())?;
    if !head.eq_ignore_ascii_case(base) {
        return None;
    }

    let rest = &path[base.len()..];
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

/// Non-empty raw segments of a path
pub fn raw_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Percent-decodes one segment; `None` if it is not valid UTF-8
pub fn decode_segment(segment: &str) -> Option<Cow<'_, str>> {
    urlencoding::decode(segment).ok()
}

/// Splits and decodes a path; `None` if any segment fails to decode
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::path::decode_segments;
///
/// let segments = decode_segments("/docs//getting%20started/").unwrap();
/// assert_eq!(segments, vec!["docs", "getting started"]);
/// ```
pub fn decode_segments(path: &str) -> Option<Vec<String>> {
    raw_segments(path)
        .map(|segment| decode_segment(segment).map(Cow::into_owned))
        .collect()
}

/// Percent-encodes a value for use as a single path segment
pub fn encode_segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_uri_relative() {
        let parts = split_uri("/search?q=rust&page=2");
        assert_eq!(parts.path, "/search");
        assert_eq!(parts.query, Some("q=rust&page=2"));
    }

    #[test]
    fn test_split_uri_query_keeps_later_question_marks() {
        let parts = split_uri("/s?q=what?");
        assert_eq!(parts.query, Some("q=what?"));
    }

    #[test]
    fn test_split_uri_absolute_without_path() {
        let parts = split_uri("https://example.com");
        assert_eq!(parts.path, "");
        assert_eq!(parts.query, None);

        let parts = split_uri("http://example.com?x=1");
        assert_eq!(parts.path, "");
        assert_eq!(parts.query, Some("x=1"));
    }

    #[test]
    fn test_split_uri_ignores_scheme_lookalike_in_path() {
        // `://` after a non-scheme prefix stays part of the path
        let parts = split_uri("/redirect/https://evil.example");
        assert_eq!(parts.path, "/redirect/https://evil.example");
    }

    #[test]
    fn test_split_uri_drops_fragment() {
        assert_eq!(split_uri("/docs#intro").path, "/docs");
        assert_eq!(split_uri("/docs?a=1#intro").query, Some("a=1"));
    }

    #[test]
    fn test_decode_segments_rejects_invalid_utf8() {
        assert!(decode_segments("/ok/%FF").is_none());
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("a b/c"), "a%20b%2Fc");
        assert_eq!(encode_segment("plain"), "plain");
    }
}
