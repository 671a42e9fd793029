//! Response assembly from an upstream response.
//!
//! # Responsibilities
//! - Carry over upstream status and headers
//! - Strip hop-by-hop headers
//! - Stream the upstream body to the client as chunks arrive
//!
//! # Design Decisions
//! - The body is never buffered; each chunk is forwarded as soon as reqwest yields it
//! - Dropping the client body (disconnect) drops the reqwest response and frees
//!   the upstream connection
//! - CORS headers are added later by the finalization middleware

use axum::body::Body;
use axum::response::Response;
use futures_util::TryStreamExt;

use crate::security::headers::relayable_response_headers;

/// Turn an upstream response into the client response without reading its body.
pub fn relay_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let headers = relayable_response_headers(upstream.headers());

    let body = upstream.bytes_stream().inspect_err(|e| {
        tracing::debug!(error = %e, "Upstream body stream failed mid-transfer");
    });

    let mut response = Response::new(Body::from_stream(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
