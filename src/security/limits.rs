//! Request limits.
//!
//! # Responsibilities
//! - Enforce maximum request body size
//!
//! # Design Decisions
//! - A declared `Content-Length` over the limit is rejected up front with 413
//! - Chunked bodies are cut off mid-stream once they cross the limit; the
//!   upstream dispatch then fails and the client sees a 500 proxy error

use tower_http::limit::RequestBodyLimitLayer;

use crate::config::LimitsConfig;

pub fn body_limit_layer(config: &LimitsConfig) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(config.max_body_bytes)
}
