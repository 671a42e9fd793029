//! The relay handler.
//!
//! ```text
//! RECEIVED → URL_RESOLVED → HOST_CHECKED → {PREFLIGHT_DONE | DISPATCHED}
//!          → RESPONSE_ASSEMBLED → (cors middleware) → SENT
//! ```
//! Any failure short-circuits to a `RelayError` response; the CORS middleware
//! finalizes it like any other.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{field, Instrument, Span};

use crate::http::error::RelayError;
use crate::http::request::request_id;
use crate::http::response::relay_response;
use crate::http::target::Target;
use crate::http::upstream::stream_request_body;
use crate::security::headers::forwardable_request_headers;
use crate::security::AllowList;

/// Methods the relay forwards. Anything else is answered with 405.
pub const RELAYED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
    Method::PATCH,
];

/// State injected into the relay handler. Read-only for the process lifetime.
#[derive(Clone)]
pub struct RelayState {
    pub allowed_hosts: Arc<AllowList>,
    pub client: reqwest::Client,
    pub response_timeout: Duration,
}

pub async fn relay_handler(
    State(state): State<RelayState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let span = tracing::info_span!(
        "relay",
        request_id = %request_id(request.headers()),
        method = %request.method(),
        peer = %peer,
        target = field::Empty,
    );

    match relay(&state, request).instrument(span.clone()).await {
        Ok(response) => response,
        Err(err) => {
            span.in_scope(|| err.report());
            err.into_response()
        }
    }
}

async fn relay(state: &RelayState, request: Request<Body>) -> Result<Response, RelayError> {
    // 1. Resolve target
    let target = Target::from_request_uri(request.uri())?;
    Span::current().record("target", field::display(&target));

    // 2. Authorize host
    if !state.allowed_hosts.permits(target.host()) {
        return Err(RelayError::ForbiddenTarget {
            host: target.host().to_string(),
        });
    }

    let method = request.method().clone();
    if !RELAYED_METHODS.contains(&method) {
        return Err(RelayError::MethodNotAllowed(method));
    }

    // 3. Preflight never reaches the upstream
    if method == Method::OPTIONS {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    // 4. Sanitize and dispatch
    let (parts, body) = request.into_parts();
    let mut headers = forwardable_request_headers(&parts.headers);
    let outbound = stream_request_body(body, &mut headers);

    tracing::info!("Proxying {} request to: {}", method, target);

    let mut upstream_request = state
        .client
        .request(method, target.into_url())
        .headers(headers);
    let mut drained = None;
    if let Some(outbound) = outbound {
        upstream_request = upstream_request.body(outbound.body);
        drained = Some(outbound.drained);
    }

    let upstream = send_upstream(upstream_request, drained, state.response_timeout).await?;

    tracing::debug!(status = %upstream.status(), "Upstream responded");

    // 5. Assemble streaming response
    Ok(relay_response(upstream))
}

/// Send the upstream request. The response timeout starts only once the
/// inbound body has been read, so a slow upload is not taken for a silent
/// upstream.
async fn send_upstream(
    request: reqwest::RequestBuilder,
    drained: Option<oneshot::Receiver<()>>,
    response_timeout: Duration,
) -> Result<reqwest::Response, RelayError> {
    let send = request.send();
    tokio::pin!(send);

    if let Some(drained) = drained {
        tokio::select! {
            result = &mut send => return Ok(result?),
            _ = drained => {}
        }
    }

    match tokio::time::timeout(response_timeout, send).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(RelayError::UpstreamTimeout(response_timeout)),
    }
}
