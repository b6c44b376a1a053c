//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Host resolution for /stats → timeouts.rs (connect deadline)
//! Request to origin:
//!     → connector connect timeout
//!     → timeouts.rs (response head deadline)
//!     → timeouts.rs (per-chunk read/write idle deadline while relaying)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries: forwarded requests may not be idempotent

pub mod timeouts;
