//! Outbound calls to the origin named by the request.

use axum::body::Body;
use axum::http::{header::HOST, HeaderMap, Method, Request, Response, Uri};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::time::Duration;

use crate::config::TimeoutConfig;
use crate::resilience::timeouts::{with_timeout, TimeoutError};
use crate::security::ProxiedHeaders;

/// HTTP client used for all origins.
pub type HttpClient = Client<HttpConnector, Body>;

/// The methods the proxy forwards. Anything else is answered with 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedMethod {
    Get,
    Post,
    Head,
    Delete,
    Put,
    Patch,
    Connect,
}

impl SupportedMethod {
    pub fn from_method(method: &Method) -> Option<Self> {
        match method.as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "HEAD" => Some(Self::Head),
            "DELETE" => Some(Self::Delete),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "CONNECT" => Some(Self::Connect),
            _ => None,
        }
    }

    pub fn as_method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Head => Method::HEAD,
            Self::Delete => Method::DELETE,
            Self::Put => Method::PUT,
            Self::Patch => Method::PATCH,
            Self::Connect => Method::CONNECT,
        }
    }
}

/// Failure talking to the origin.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error(transparent)]
    Timeout(#[from] TimeoutError),
}

impl UpstreamError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// The URL a request should be forwarded to.
///
/// Absolute-form targets are used as is, as are authority-form `CONNECT`
/// targets. Origin-form targets are qualified with the `Host` header.
pub fn resolve_target(uri: &Uri, headers: &HeaderMap) -> Option<Uri> {
    if uri.authority().is_some() {
        return Some(uri.clone());
    }

    let host = headers.get(HOST)?.to_str().ok()?;
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    tracing::debug!(host = %host, path = %path, "Qualifying origin-form target with Host");
    Uri::builder()
        .scheme("http")
        .authority(host)
        .path_and_query(path)
        .build()
        .ok()
}

/// Sends requests to origins with bounded connect and response-head waits.
#[derive(Clone)]
pub struct UpstreamForwarder {
    client: HttpClient,
    response_timeout: Duration,
}

impl UpstreamForwarder {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeouts.connect()));

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self {
            client,
            response_timeout: timeouts.response(),
        }
    }

    /// Issue the request and return the origin's response with its body unread.
    pub async fn forward(
        &self,
        method: SupportedMethod,
        url: Uri,
        headers: ProxiedHeaders,
        body: Body,
    ) -> Result<Response<Incoming>, UpstreamError> {
        let mut request = Request::new(body);
        *request.method_mut() = method.as_method();
        *request.uri_mut() = url;
        *request.headers_mut() = headers.into_inner();

        let response = with_timeout(
            "upstream response",
            self.response_timeout,
            self.client.request(request),
        )
        .await??;
        Ok(response)
    }
}
