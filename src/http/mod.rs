//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → cors.rs (wraps everything below)
//!     → relay.rs
//!         → target.rs (path → absolute URL)
//!         → security (allow-list, header sanitization)
//!         → upstream.rs (reqwest client, body pump)
//!         → response.rs (status, headers, streamed body)
//!     → Send to client
//! ```

pub mod cors;
pub mod error;
pub mod relay;
pub mod request;
pub mod response;
pub mod server;
pub mod target;
pub mod upstream;

pub use cors::CorsPolicy;
pub use error::RelayError;
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};
pub use target::Target;
