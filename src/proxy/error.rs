//! Request pipeline errors and their HTTP mapping.

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::response::empty_response;
use crate::proxy::forward::UpstreamError;

/// Why a proxied request was answered locally instead of relayed.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("unsupported method {0}")]
    UnsupportedMethod(Method),

    #[error("range query {query:?} conflicts with Range header {header:?}")]
    RangeConflict { query: String, header: String },

    #[error("range {0:?} is not a valid header value")]
    InvalidRange(String),

    #[error("request names no usable target URL")]
    InvalidTarget,

    #[error("request already passed through this proxy")]
    ForwardingLoop,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnsupportedMethod(_)
            | Self::InvalidTarget
            | Self::InvalidRange(_)
            | Self::ForwardingLoop => StatusCode::BAD_REQUEST,
            Self::RangeConflict { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::Upstream(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        empty_response(self.status())
    }
}
