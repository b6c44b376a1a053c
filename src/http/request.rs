//! Request inspection helpers.
//!
//! # Responsibilities
//! - Generate a unique request ID for log correlation
//! - Extract the host a request names (for the /stats loopback check)
//!
//! # Design Decisions
//! - Request ID is created as early as possible and lives in the tracing span
//! - The ID is not injected into forwarded headers; origins see the client's headers

use axum::http::{header::HOST, Request};
use uuid::Uuid;

/// Unique identifier for one inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The `host[:port]` a request names: its `Host` header, or the authority of
/// an absolute-form target.
pub fn request_host<B>(request: &Request<B>) -> Option<String> {
    request
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.to_string()))
}
