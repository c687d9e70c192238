//! Target resolution: pull the `url` parameter out of the inbound query and
//! rebuild it with the caller's remaining parameters appended.

use url::form_urlencoded;
use url::Url;

use crate::error::ForwardError;

/// Query key carrying the target address. Never forwarded.
pub const TARGET_PARAM: &str = "url";

/// Decode a raw query string into ordered `(key, value)` pairs.
///
/// Duplicates are kept and a bare key pairs with `""`.
pub fn query_pairs(query: Option<&str>) -> Vec<(String, String)> {
    match query {
        Some(q) => form_urlencoded::parse(q.as_bytes()).into_owned().collect(),
        None => Vec::new(),
    }
}

/// Resolve the outbound URL from the inbound request's raw query string.
///
/// When `url` occurs more than once the last occurrence wins; every
/// occurrence is dropped from the forwarded set.
pub fn resolve_target(inbound_query: Option<&str>) -> Result<Url, ForwardError> {
    let pairs = query_pairs(inbound_query);

    let raw_target = pairs
        .iter()
        .rev()
        .find(|(k, _)| k == TARGET_PARAM)
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
        .ok_or(ForwardError::MissingTarget)?;

    let forwarded = pairs
        .iter()
        .filter(|(k, _)| k != TARGET_PARAM)
        .map(|(k, v)| (k.as_str(), v.as_str()));

    rebuild_url(raw_target, forwarded)
}

/// Parse `raw_target` and replace its query with its own pairs followed by
/// `forwarded`, re-encoded as `application/x-www-form-urlencoded`.
///
/// Scheme, authority, path and fragment are kept as parsed.
pub fn rebuild_url<'a, I>(raw_target: &str, forwarded: I) -> Result<Url, ForwardError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut url = Url::parse(raw_target)
        .map_err(|e| ForwardError::InvalidTargetUrl(format!("{raw_target}: {e}")))?;

    if !matches!(url.host_str(), Some(host) if !host.is_empty()) {
        return Err(ForwardError::InvalidTargetUrl(format!(
            "{raw_target}: missing host"
        )));
    }

    let mut merged: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    merged.extend(forwarded.into_iter().map(|(k, v)| (k.to_owned(), v.to_owned())));

    if merged.is_empty() {
        url.set_query(None);
    } else {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&merged)
            .finish();
        url.set_query(Some(&query));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_PARAMS: [(&str, &str); 0] = [];

    fn pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs().into_owned().collect()
    }

    fn owned(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_target_params_come_first() {
        let url = rebuild_url("https://example.com/a?x=1&y=2", [("y", "3"), ("z", "4")]).unwrap();

        assert_eq!(
            pairs(&url),
            owned(&[("x", "1"), ("y", "2"), ("y", "3"), ("z", "4")])
        );
        assert_eq!(url.as_str(), "https://example.com/a?x=1&y=2&y=3&z=4");
    }

    #[test]
    fn test_resolve_from_encoded_inbound_query() {
        let url = resolve_target(Some(
            "url=https%3A%2F%2Fexample.com%2Fa%3Fx%3D1%26y%3D2&y=3&z=4",
        ))
        .unwrap();

        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.path(), "/a");
        assert_eq!(
            pairs(&url),
            owned(&[("x", "1"), ("y", "2"), ("y", "3"), ("z", "4")])
        );
    }

    #[test]
    fn test_reserved_key_never_forwarded() {
        let url = resolve_target(Some(
            "url=https%3A%2F%2Ffirst.example%2F&k=v&url=https%3A%2F%2Fsecond.example%2Fp",
        ))
        .unwrap();

        assert_eq!(url.host_str(), Some("second.example"));
        assert_eq!(url.path(), "/p");
        assert_eq!(pairs(&url), owned(&[("k", "v")]));
        assert!(!url.query().unwrap_or_default().contains("url="));
    }

    #[test]
    fn test_fragment_survives_merge() {
        let url = rebuild_url("https://example.com/p?x=1#section", [("y", "2")]).unwrap();

        assert_eq!(url.fragment(), Some("section"));
        assert_eq!(url.as_str(), "https://example.com/p?x=1&y=2#section");
    }

    #[test]
    fn test_missing_target() {
        for query in [None, Some(""), Some("a=1&b=2"), Some("url="), Some("url")] {
            let err = resolve_target(query).unwrap_err();
            assert!(
                matches!(err, ForwardError::MissingTarget),
                "query {query:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_relative_or_hostless_target_is_invalid() {
        for raw in ["example.com/path", "/just/a/path", "mailto:someone@example.com", "not a url"] {
            let err = rebuild_url(raw, NO_PARAMS).unwrap_err();
            assert!(
                matches!(err, ForwardError::InvalidTargetUrl(_)),
                "{raw} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_no_params_means_no_question_mark() {
        let url = rebuild_url("https://example.com/plain", NO_PARAMS).unwrap();
        assert_eq!(url.as_str(), "https://example.com/plain");

        let url = rebuild_url("https://example.com/plain?", NO_PARAMS).unwrap();
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_bare_key_pairs_with_empty_value() {
        let url = rebuild_url("https://example.com/?flag&a=1", [("b", "")]).unwrap();

        assert_eq!(pairs(&url), owned(&[("flag", ""), ("a", "1"), ("b", "")]));
        assert_eq!(url.query(), Some("flag=&a=1&b="));
    }

    #[test]
    fn test_form_encoding_of_values() {
        let url = rebuild_url("https://example.com/search", [("q", "a b&c"), ("π", "1")]).unwrap();

        assert_eq!(url.query(), Some("q=a+b%26c&%CF%80=1"));
        assert_eq!(pairs(&url), owned(&[("q", "a b&c"), ("π", "1")]));
    }

    #[test]
    fn test_authority_port_and_path_preserved() {
        let url = rebuild_url("http://user@localhost:8081/v1/items/", [("page", "2")]).unwrap();

        assert_eq!(url.scheme(), "http");
        assert_eq!(url.username(), "user");
        assert_eq!(url.port(), Some(8081));
        assert_eq!(url.path(), "/v1/items/");
        assert_eq!(url.query(), Some("page=2"));
    }
}
