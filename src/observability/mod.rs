//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request pipeline produces:
//!     → logging.rs (structured log events, per-request spans)
//!     → metrics.rs (counters, histograms)
//!     → stats.rs (uptime and relayed bytes for /stats)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//!     → /stats endpoint (loopback callers)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every log line of a request
//! - Counters are cheap (atomic increments)

pub mod logging;
pub mod metrics;
pub mod stats;

pub use stats::{StatsSnapshot, StatsTracker};
