//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay handler on every path
//! - Wire up middleware (request ID, tracing, CORS, panic capture, body limit)
//! - Bind server to listener and serve until shutdown

use axum::{body::Body, http::Response, middleware, routing::any, Router};
use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::cors::{finalize_cors, CorsPolicy};
use crate::http::error::RelayError;
use crate::http::relay::{relay_handler, RelayState};
use crate::http::request::UuidRequestId;
use crate::http::upstream::build_client;
use crate::observability::metrics::track_requests;
use crate::security::limits::body_limit_layer;
use crate::security::AllowList;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, ServerError> {
        let allowed_hosts = Arc::new(AllowList::from_entries(&config.targets.allowed_hosts));
        let cors = Arc::new(CorsPolicy::new(AllowList::from_entries(
            &config.cors.allowed_origins,
        )));

        if config.upstream.danger_accept_invalid_certs {
            tracing::warn!("INSECURE: upstream TLS certificate verification is disabled");
        }
        let client = build_client(&config.upstream, allowed_hosts.clone())?;

        let state = RelayState {
            allowed_hosts,
            client,
            response_timeout: config.upstream.response_timeout(),
        };

        let router = Self::build_router(&config, state, cors);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Outermost first: request ID, trace, metrics, CORS finalization, panic
    /// capture, body limit. Everything the inner layers produce gets CORS
    /// headers and is counted.
    fn build_router(config: &RelayConfig, state: RelayState, cors: Arc<CorsPolicy>) -> Router {
        Router::new()
            .route("/{*target}", any(relay_handler))
            .route("/", any(relay_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TraceLayer::new_for_http())
                    .layer(middleware::from_fn(track_requests))
                    .layer(middleware::from_fn_with_state(cors, finalize_cors))
                    .layer(CatchPanicLayer::custom(internal_error_for_panic))
                    .layer(body_limit_layer(&config.limits)),
            )
    }

    /// Serve on `listener` until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

fn internal_error_for_panic(panic: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    let err = RelayError::Internal(detail);
    err.report();
    axum::response::IntoResponse::into_response(err)
}
