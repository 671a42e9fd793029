//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (cap body size)
//!     → access_control.rs (target host allow-list)
//!     → headers.rs (sanitize before forwarding)
//!     → upstream
//! Upstream response:
//!     → headers.rs (strip hop-by-hop)
//!     → client
//! ```
//!
//! # Design Decisions
//! - Fail closed: a host missing from the allow-list is never contacted
//! - No trust in client input

pub mod access_control;
pub mod headers;
pub mod limits;

pub use access_control::AllowList;
