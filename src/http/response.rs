//! Locally generated responses.
//!
//! # Responsibilities
//! - Empty error responses carrying the proxy's `Via` header
//! - The JSON `/stats` response
//!
//! # Design Decisions
//! - Error responses have an empty body and an explicit `Content-Length: 0`
//! - Relayed origin responses are built in `proxy::relay`, not here

use axum::body::Body;
use axum::http::{
    header::{CONTENT_LENGTH, CONTENT_TYPE, VIA},
    HeaderValue, Response, StatusCode,
};

use crate::observability::StatsTracker;
use crate::security::headers::VIA_VALUE;

/// Empty-bodied response with `Via` and `Content-Length: 0`.
pub fn empty_response(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(VIA, VIA_VALUE.clone());
    headers.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
    response
}

/// `/stats` body for the current counters.
pub fn stats_response(stats: &StatsTracker) -> Response<Body> {
    let body = match stats.to_json() {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode stats");
            return empty_response(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let mut response = Response::new(Body::empty());
    let headers = response.headers_mut();
    headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    *response.body_mut() = Body::from(body);
    response
}
