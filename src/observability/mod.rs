//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! relay handler and middleware stack produce:
//!     → logging.rs (structured log events, one span per request)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log record of a request
//! - Metrics are cheap (atomic increments) and off unless an address is configured

pub mod logging;
pub mod metrics;
