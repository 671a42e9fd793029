//! Upstream HTTP client and request body streaming.

use axum::body::{Body, HttpBody};
use axum::http::{header::CONTENT_LENGTH, HeaderMap, HeaderValue};
use futures_util::{stream, StreamExt};
use reqwest::redirect;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::config::UpstreamConfig;
use crate::security::AllowList;

/// Chunks buffered between the inbound body and the upstream connection.
const BODY_CHANNEL_CAPACITY: usize = 8;

/// Build the shared upstream client.
///
/// Redirects are followed only while every hop stays on an allowed host;
/// otherwise the 3xx response itself is relayed to the client.
pub fn build_client(
    config: &UpstreamConfig,
    allowed_hosts: Arc<AllowList>,
) -> Result<reqwest::Client, reqwest::Error> {
    let max_redirects = config.max_redirects;
    let policy = redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            return attempt.stop();
        }
        let permitted = attempt
            .url()
            .host_str()
            .is_some_and(|host| allowed_hosts.permits(host));
        if permitted {
            attempt.follow()
        } else {
            tracing::warn!(location = %attempt.url(), "Not following redirect to unauthorized host");
            attempt.stop()
        }
    });

    let mut builder = reqwest::Client::builder()
        .connect_timeout(config.connect_timeout())
        .redirect(policy)
        .danger_accept_invalid_certs(config.danger_accept_invalid_certs);
    if !config.use_system_proxy {
        builder = builder.no_proxy();
    }
    builder.build()
}

/// An inbound body on its way to the upstream.
pub struct OutboundBody {
    pub body: reqwest::Body,
    /// Resolves once the inbound body has been read to the end or failed.
    pub drained: oneshot::Receiver<()>,
}

/// Stream an inbound body to the upstream without collecting it.
///
/// A known length is advertised with `Content-Length`. Unknown lengths go out
/// chunked. An empty body yields `None` so no body is sent at all.
pub fn stream_request_body(body: Body, headers: &mut HeaderMap) -> Option<OutboundBody> {
    let size = body.size_hint();
    match size.exact() {
        Some(0) => return None,
        Some(len) => {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
        }
        None => {}
    }

    // The pump task ends when the body is exhausted, errors, or the upstream
    // side drops the receiver.
    let (tx, mut rx) = mpsc::channel(BODY_CHANNEL_CAPACITY);
    let (drained_tx, drained) = oneshot::channel();
    tokio::spawn(async move {
        let mut chunks = body.into_data_stream();
        while let Some(chunk) = chunks.next().await {
            let failed = chunk.is_err();
            if tx.send(chunk).await.is_err() || failed {
                break;
            }
        }
        let _ = drained_tx.send(());
    });

    Some(OutboundBody {
        body: reqwest::Body::wrap_stream(stream::poll_fn(move |cx| rx.poll_recv(cx))),
        drained,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_length_is_advertised() {
        let mut headers = HeaderMap::new();
        let outbound = stream_request_body(Body::from("hello world"), &mut headers);
        assert_eq!(headers[CONTENT_LENGTH], "11");

        // The pump reads the whole inbound body without waiting for a sender.
        let drained = outbound.unwrap().drained;
        tokio::time::timeout(std::time::Duration::from_secs(1), drained)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_empty_body_sends_nothing() {
        let mut headers = HeaderMap::new();
        let body = stream_request_body(Body::empty(), &mut headers);
        assert!(headers.get(CONTENT_LENGTH).is_none());
        assert!(body.is_none());
    }

    #[test]
    fn test_client_builds_with_defaults() {
        let client = build_client(&UpstreamConfig::default(), Arc::new(AllowList::Any));
        assert!(client.is_ok());
    }

    // Certificate checks are exercised only up to client construction: an
    // end-to-end check needs a TLS upstream, which the test backends don't serve.
    #[test]
    fn test_client_builds_with_insecure_tls() {
        let config = UpstreamConfig {
            danger_accept_invalid_certs: true,
            use_system_proxy: true,
            ..UpstreamConfig::default()
        };
        let client = build_client(&config, Arc::new(AllowList::from_entries(["127.0.0.1"])));
        assert!(client.is_ok());
    }
}
