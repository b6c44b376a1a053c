//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, per-request span with request ID)
//!     → router.rs (stats path or proxy path)
//!     → response.rs (stats JSON, empty error responses)
//!       or crate::proxy (forward and relay)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod router;
pub mod server;

pub use request::RequestId;
pub use router::{RequestRouter, Route};
pub use server::HttpServer;
