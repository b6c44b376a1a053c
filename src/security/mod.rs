//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → loopback.rs (gate /stats on a loopback host)
//!     → headers.rs (sanitize, add X-Forwarded-*)
//!     → Pass to forwarding
//! ```
//!
//! # Design Decisions
//! - /stats is only served when the named host resolves to loopback
//! - Hop-by-hop headers never cross the proxy

pub mod headers;
pub mod loopback;

pub use headers::ProxiedHeaders;
pub use loopback::{LoopbackGuard, ResolutionError};
