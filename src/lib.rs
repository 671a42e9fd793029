//! CORS relay library.
//!
//! Forwards browser requests to third-party HTTP APIs and returns the upstream
//! response with permissive CORS headers, so a page can read APIs that do not
//! opt into cross-origin access themselves.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
