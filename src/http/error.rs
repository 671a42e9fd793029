//! Relay failure taxonomy and its mapping onto HTTP responses.

use axum::http::{header::ALLOW, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;
use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;

use crate::http::cors::ALLOW_METHODS;

/// Errors terminating a relayed request. None of them are retried here.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The request path does not hold a usable absolute URL.
    #[error("Invalid target URL: {0}")]
    InvalidTarget(String),

    /// Target host is missing from the allow-list.
    #[error("Unauthorized target host")]
    ForbiddenTarget { host: String },

    /// Method outside the relayed set.
    #[error("Method not allowed")]
    MethodNotAllowed(Method),

    /// Inbound body crossed the size limit while being streamed.
    #[error("Payload Too Large")]
    PayloadTooLarge,

    /// Transport failure talking to the upstream.
    #[error("Proxy Error: {}", describe(.0))]
    Upstream(#[source] reqwest::Error),

    /// Upstream sent no response headers in time.
    #[error("Proxy Error: upstream did not respond within {}s", .0.as_secs())]
    UpstreamTimeout(Duration),

    /// Anything else. The detail is logged, never sent to the client.
    #[error("Internal Proxy Error")]
    Internal(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            Self::ForbiddenTarget { .. } => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upstream(_) | Self::UpstreamTimeout(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Emit the log record for this failure at its severity. Request id and
    /// target come from the enclosing span.
    pub fn report(&self) {
        match self {
            Self::InvalidTarget(reason) => {
                tracing::warn!(reason = %reason, "Rejected malformed target URL");
            }
            Self::ForbiddenTarget { host } => {
                tracing::warn!(host = %host, "Blocked request to unauthorized target host");
            }
            Self::MethodNotAllowed(method) => {
                tracing::warn!(method = %method, "Rejected unsupported method");
            }
            Self::PayloadTooLarge => {
                tracing::warn!("Request body exceeded the size limit mid-stream");
            }
            Self::Upstream(_) | Self::UpstreamTimeout(_) => {
                tracing::error!(error = %self, "Error proxying request");
            }
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "Unexpected error while relaying");
            }
        }
    }
}

impl From<reqwest::Error> for RelayError {
    /// A send that failed because the inbound body hit the size limit is the
    /// client's fault, not the upstream's.
    fn from(err: reqwest::Error) -> Self {
        if exceeded_body_limit(&err) {
            Self::PayloadTooLarge
        } else {
            Self::Upstream(err)
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), self.to_string()).into_response();
        if let Self::MethodNotAllowed(_) = self {
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static(ALLOW_METHODS));
        }
        response
    }
}

/// Render an error with its whole source chain, e.g.
/// `error sending request for url (..): client error (Connect): Connection refused`.
pub fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !out.contains(&cause_text) {
            out.push_str(": ");
            out.push_str(&cause_text);
        }
        source = cause.source();
    }
    out
}

fn exceeded_body_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(cause) = current {
        if cause.is::<LengthLimitError>() {
            return true;
        }
        current = cause.source();
    }
    false
}
