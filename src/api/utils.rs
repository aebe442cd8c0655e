//! API utility functions
//!
//! Pure helpers for request parsing and response relaying, kept out of the
//! handlers so they can be unit tested.

use axum::{
    body::Body,
    http::{HeaderName, header},
    response::Response,
};
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};

use crate::api::error::ApiError;
use crate::upstream::UpstreamResponse;

/// Integer prefix of a query value: `"12"`, `" 12abc"` and `"12.5"` all read as 12
///
/// Returns `None` when there is no leading digit.
pub fn parse_query_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

fn is_single_dot(segment: &str) -> bool {
    segment == "." || segment.eq_ignore_ascii_case("%2e")
}

fn is_double_dot(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().as_str(),
        ".." | ".%2e" | "%2e." | "%2e%2e"
    )
}

/// Collapse `.` and `..` segments, including their `%2e` spellings, the way a URL
/// parser does. `..` never climbs above `/`.
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    let mut trailing_slash = false;

    for segment in path.split('/').skip(1) {
        trailing_slash = false;
        if is_single_dot(segment) {
            trailing_slash = true;
        } else if is_double_dot(segment) {
            segments.pop();
            trailing_slash = true;
        } else {
            segments.push(segment);
        }
    }

    let mut normalized = String::with_capacity(path.len());
    for segment in &segments {
        normalized.push('/');
        normalized.push_str(segment);
    }
    if trailing_slash || normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

/// Reads the request body, refusing anything over `limit` bytes
///
/// Decompression is handled earlier by `RequestDecompressionLayer`, so the limit
/// applies to the decoded body. A body that cannot be decoded is `InvalidBody`.
pub async fn read_body(body: Body, limit: usize) -> Result<Bytes, ApiError> {
    let collected = Limited::new(body, limit).collect().await.map_err(|err| {
        if err.downcast_ref::<LengthLimitError>().is_some() {
            ApiError::PayloadTooLarge(limit)
        } else {
            tracing::debug!(error = %err, "Failed to read request body");
            ApiError::InvalidBody
        }
    })?;

    Ok(collected.to_bytes())
}

/// Connection-level headers that must not be forwarded from upstream
fn is_hop_by_hop(name: &HeaderName) -> bool {
    [
        header::CONNECTION,
        header::TRANSFER_ENCODING,
        header::CONTENT_LENGTH,
        header::TE,
        header::TRAILER,
        header::UPGRADE,
        header::PROXY_AUTHENTICATE,
        header::PROXY_AUTHORIZATION,
    ]
    .contains(name)
        || name.as_str() == "keep-alive"
}

/// Relay an upstream response: same status, body and end-to-end headers
pub fn relay(upstream: UpstreamResponse) -> Response {
    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;

    let headers = response.headers_mut();
    for (name, value) in upstream.headers.iter() {
        if !is_hop_by_hop(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, StatusCode};

    #[test]
    fn test_parse_query_int() {
        assert_eq!(parse_query_int("12"), Some(12));
        assert_eq!(parse_query_int("  7"), Some(7));
        assert_eq!(parse_query_int("12abc"), Some(12));
        assert_eq!(parse_query_int("3.9"), Some(3));
        assert_eq!(parse_query_int("-4"), Some(-4));
        assert_eq!(parse_query_int("+5"), Some(5));
        assert_eq!(parse_query_int("0"), Some(0));
    }

    #[test]
    fn test_parse_query_int_rejects_non_numeric() {
        assert_eq!(parse_query_int(""), None);
        assert_eq!(parse_query_int("abc"), None);
        assert_eq!(parse_query_int("-"), None);
        assert_eq!(parse_query_int("99999999999999999999"), None);
    }

    #[test]
    fn test_normalize_path_collapses_dot_segments() {
        assert_eq!(normalize_path("/static/file.txt"), "/static/file.txt");
        assert_eq!(normalize_path("/../static/file.txt"), "/static/file.txt");
        assert_eq!(normalize_path("/%2e%2e/static/file.txt"), "/static/file.txt");
        assert_eq!(normalize_path("/%2E%2e/%2e./.%2E/x"), "/x");
        assert_eq!(normalize_path("/a/./b/%2e/c"), "/a/b/c");
        assert_eq!(normalize_path("/a/b/../c"), "/a/c");
        assert_eq!(normalize_path("/simulator/v2/../../etc"), "/etc");
    }

    #[test]
    fn test_normalize_path_keeps_shape() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/a/"), "/a/");
        assert_eq!(normalize_path("/a/.."), "/");
        assert_eq!(normalize_path("/a/b/."), "/a/b/");
        assert_eq!(normalize_path("/a//b"), "/a//b");
        assert_eq!(normalize_path("/a..b/.hidden"), "/a..b/.hidden");
    }

    #[tokio::test]
    async fn test_read_body_within_limit() {
        let body = Body::from("{\"type\":1}");
        let bytes = read_body(body, 1024).await.unwrap();
        assert_eq!(bytes, Bytes::from_static(b"{\"type\":1}"));
    }

    #[tokio::test]
    async fn test_read_body_too_large() {
        let body = Body::from(vec![b'x'; 2048]);
        let result = read_body(body, 1024).await;
        match result {
            Err(ApiError::PayloadTooLarge(limit)) => assert_eq!(limit, 1024),
            other => panic!("Expected PayloadTooLarge error, got {other:?}"),
        }
    }

    #[test]
    fn test_relay_strips_hop_by_hop_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        headers.insert(header::ETAG, HeaderValue::from_static("\"abc\""));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));

        let response = relay(UpstreamResponse {
            status: StatusCode::ACCEPTED,
            headers,
            body: Bytes::from_static(b"hello"),
        });

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(response.headers()[header::ETAG], "\"abc\"");
        assert!(response.headers().get(header::CONNECTION).is_none());
        assert!(response.headers().get(header::TRANSFER_ENCODING).is_none());
        assert!(response.headers().get("keep-alive").is_none());
    }
}
