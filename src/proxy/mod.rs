//! Forward-proxy pipeline.
//!
//! # Data Flow
//! ```text
//! Proxy-path request
//!     → range.rs (reconcile ?range= with Range header; conflict → 416)
//!     → security::headers (loop check, X-Forwarded-*, Via, hop-by-hop stripping)
//!     → forward.rs (method table, target URL, outbound call)
//!     → relay.rs (copy head, add Via, count bytes, stream body)
//!     → client
//! ```
//!
//! # Design Decisions
//! - The range check runs before anything else and never contacts the origin
//! - Every failure is local to its request and maps to one status code
//! - The request body is streamed to the origin, never buffered

pub mod error;
pub mod forward;
pub mod range;
pub mod relay;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header::RANGE, Request, Response};
use std::net::SocketAddr;
use std::sync::Arc;

pub use error::ProxyError;
pub use forward::{SupportedMethod, UpstreamError, UpstreamForwarder};
pub use range::{reconcile, RangeResult};
pub use relay::ResponseRelay;

use crate::config::TimeoutConfig;
use crate::observability::StatsTracker;
use crate::security::headers::has_passed_through;
use crate::security::ProxiedHeaders;

/// Runs the proxy path for one request.
#[derive(Clone)]
pub struct Proxy {
    forwarder: UpstreamForwarder,
    relay: ResponseRelay,
}

impl Proxy {
    pub fn new(timeouts: &TimeoutConfig, stats: Arc<StatsTracker>) -> Self {
        Self {
            forwarder: UpstreamForwarder::new(timeouts),
            relay: ResponseRelay::new(stats, timeouts.idle()),
        }
    }

    /// Forward `request` to its origin and relay the answer.
    pub async fn handle(&self, request: Request<Body>) -> Result<Response<Body>, ProxyError> {
        let (parts, body) = request.into_parts();

        let query_range = range::query_range(parts.uri.query());
        let header_range = parts
            .headers
            .get(RANGE)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

        let range = reconcile(query_range.as_deref(), header_range.as_deref());
        if range == RangeResult::Rejected {
            return Err(ProxyError::RangeConflict {
                query: query_range.unwrap_or_default(),
                header: header_range.unwrap_or_default(),
            });
        }

        if has_passed_through(&parts.headers) {
            return Err(ProxyError::ForwardingLoop);
        }

        let client_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let mut headers = ProxiedHeaders::from_incoming(&parts.headers, client_ip);
        if let RangeResult::Rewritten(value) = &range {
            headers
                .set_range(value)
                .map_err(|_| ProxyError::InvalidRange(value.clone()))?;
        }

        let method = SupportedMethod::from_method(&parts.method)
            .ok_or_else(|| ProxyError::UnsupportedMethod(parts.method.clone()))?;
        let target =
            forward::resolve_target(&parts.uri, &parts.headers).ok_or(ProxyError::InvalidTarget)?;

        tracing::debug!(
            target = %target,
            range = ?headers.range(),
            "Forwarding request"
        );

        let upstream = self.forwarder.forward(method, target, headers, body).await?;
        Ok(self.relay.relay(upstream))
    }
}
