//! CORS finalization.
//!
//! Every response leaving the relay passes through [`finalize_cors`], so success,
//! preflight, rejections, limit-layer 413s and caught panics all carry the same
//! headers. Upstream values for these headers are overwritten.

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
            ORIGIN,
        },
        HeaderMap, HeaderValue, Request,
    },
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::security::AllowList;

pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS, PATCH";
pub const ALLOW_HEADERS: &str = "Origin, X-Requested-With, Content-Type, Accept, Authorization";
/// Preflight cache lifetime (24 hours).
pub const MAX_AGE_SECS: &str = "86400";

/// Decides the CORS headers for a response given the request's `Origin`.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origins: AllowList,
}

impl CorsPolicy {
    pub fn new(origins: AllowList) -> Self {
        Self { origins }
    }

    /// `Access-Control-Allow-Origin` for a request carrying `origin`.
    pub fn allow_origin(&self, origin: Option<&HeaderValue>) -> HeaderValue {
        if self.origins.is_any() {
            return HeaderValue::from_static("*");
        }
        match origin {
            Some(value) if value.to_str().is_ok_and(|o| self.origins.permits(o)) => value.clone(),
            _ => HeaderValue::from_static("null"),
        }
    }

    pub fn apply(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin(origin));
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE_SECS));
    }
}

/// Middleware applying [`CorsPolicy`] to whatever the inner stack returns.
pub async fn finalize_cors(
    State(policy): State<Arc<CorsPolicy>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let origin = req.headers().get(ORIGIN).cloned();
    let mut response = next.run(req).await;
    policy.apply(origin.as_ref(), response.headers_mut());
    response
}
