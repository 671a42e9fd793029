//! Header sanitization in both directions.
//!
//! # Responsibilities
//! - Drop connection-specific request headers before forwarding upstream
//! - Strip hop-by-hop headers from upstream responses
//!
//! # Design Decisions
//! - Works on `HeaderMap` so case-insensitive lookup and repeated values survive
//! - Exclusion lists are fixed; everything else passes through untouched

use axum::http::header::{
    HeaderMap, HeaderName, CONNECTION, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, HOST,
    ORIGIN, TRANSFER_ENCODING,
};

/// Request headers never forwarded upstream.
pub const EXCLUDED_REQUEST_HEADERS: [HeaderName; 4] = [HOST, ORIGIN, CONNECTION, CONTENT_LENGTH];

/// Upstream response headers never relayed to the client.
pub const HOP_BY_HOP_RESPONSE_HEADERS: [HeaderName; 4] =
    [CONTENT_ENCODING, CONTENT_LENGTH, TRANSFER_ENCODING, CONNECTION];

/// Headers to send upstream for an inbound request.
pub fn forwardable_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = filter_headers(inbound, &EXCLUDED_REQUEST_HEADERS);
    // Content-Type is re-set explicitly so it always reaches the upstream.
    if let Some(content_type) = inbound.get(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, content_type.clone());
    }
    headers
}

/// Headers to relay back from an upstream response.
pub fn relayable_response_headers(upstream: &HeaderMap) -> HeaderMap {
    filter_headers(upstream, &HOP_BY_HOP_RESPONSE_HEADERS)
}

fn filter_headers(source: &HeaderMap, excluded: &[HeaderName]) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(source.len());
    for (name, value) in source {
        if !excluded.contains(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{ACCEPT, SET_COOKIE};
    use axum::http::HeaderValue;

    #[test]
    fn test_request_headers_drop_connection_specific() {
        let mut inbound = HeaderMap::new();
        inbound.insert(HOST, HeaderValue::from_static("relay.local:8080"));
        inbound.insert(ORIGIN, HeaderValue::from_static("http://localhost:3000"));
        inbound.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        inbound.insert(CONTENT_LENGTH, HeaderValue::from_static("12"));
        inbound.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        inbound.insert(ACCEPT, HeaderValue::from_static("*/*"));
        inbound.insert("x-api-key", HeaderValue::from_static("secret"));

        let forwarded = forwardable_request_headers(&inbound);

        assert!(forwarded.get(HOST).is_none());
        assert!(forwarded.get(ORIGIN).is_none());
        assert!(forwarded.get(CONNECTION).is_none());
        assert!(forwarded.get(CONTENT_LENGTH).is_none());
        assert_eq!(forwarded.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(forwarded.get(ACCEPT).unwrap(), "*/*");
        assert_eq!(forwarded.get("X-Api-Key").unwrap(), "secret");
        assert_eq!(forwarded.len(), 3);
    }

    #[test]
    fn test_request_headers_keep_repeated_values_in_order() {
        let mut inbound = HeaderMap::new();
        inbound.append("x-trace", HeaderValue::from_static("a"));
        inbound.append("x-trace", HeaderValue::from_static("b"));

        let forwarded = forwardable_request_headers(&inbound);
        let values: Vec<_> = forwarded.get_all("x-trace").iter().collect();
        assert_eq!(values, ["a", "b"]);
    }

    #[test]
    fn test_response_strips_exactly_hop_by_hop() {
        let mut upstream = HeaderMap::new();
        upstream.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        upstream.insert(CONTENT_LENGTH, HeaderValue::from_static("42"));
        upstream.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        upstream.insert(CONNECTION, HeaderValue::from_static("close"));
        upstream.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        upstream.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        upstream.append(SET_COOKIE, HeaderValue::from_static("b=2"));

        let relayed = relayable_response_headers(&upstream);

        for name in HOP_BY_HOP_RESPONSE_HEADERS.iter() {
            assert!(relayed.get(name).is_none(), "{name} should be stripped");
        }
        assert_eq!(relayed.get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(relayed.get_all(SET_COOKIE).iter().count(), 2);
        assert_eq!(relayed.len(), 3);
    }
}
