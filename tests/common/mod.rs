//! Shared utilities for integration and load testing.

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use async_http_proxy::{HttpServer, ProxyConfig, Shutdown, StatsTracker};

/// Size of the document served at `/` by the mock origin.
pub const DOCUMENT_LEN: usize = 1256;

pub fn document() -> Vec<u8> {
    (0..DOCUMENT_LEN).map(|i| b'a' + (i % 26) as u8).collect()
}

/// Parse `bytes=N-` or `bytes=N-M` against a resource of `len` bytes.
fn byte_range(value: &str, len: usize) -> Option<(usize, usize)> {
    let spec = value.strip_prefix("bytes=")?;
    let (start, end) = spec.split_once('-')?;
    let start: usize = start.trim().parse().ok()?;
    let end: usize = match end.trim() {
        "" => len - 1,
        end => end.parse::<usize>().ok()?.min(len - 1),
    };
    (start <= end).then_some((start, end))
}

async fn serve_document(headers: HeaderMap) -> Response {
    let body = document();
    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());

    let (status, slice, content_range) = match range {
        None => (StatusCode::OK, body.clone(), None),
        Some(value) => match byte_range(value, body.len()) {
            Some((start, end)) => (
                StatusCode::PARTIAL_CONTENT,
                body[start..=end].to_vec(),
                Some(format!("bytes {}-{}/{}", start, end, body.len())),
            ),
            None => {
                return (
                    StatusCode::RANGE_NOT_SATISFIABLE,
                    [(header::CONTENT_RANGE, format!("bytes */{}", body.len()))],
                )
                    .into_response()
            }
        },
    };

    let mut response = (
        status,
        [
            (header::CONTENT_TYPE, "text/html; charset=UTF-8".to_string()),
            (header::ACCEPT_RANGES, "bytes".to_string()),
        ],
        slice,
    )
        .into_response();
    if let Some(content_range) = content_range {
        response
            .headers_mut()
            .insert(header::CONTENT_RANGE, content_range.parse().unwrap());
    }
    response
}

async fn echo_headers(headers: HeaderMap) -> impl IntoResponse {
    let value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    axum::Json(serde_json::json!({
        "range": value("range"),
        "x-forwarded-for": value("x-forwarded-for"),
        "x-forwarded-proto": value("x-forwarded-proto"),
        "host": value("host"),
    }))
}

/// Start a mock origin on an ephemeral port.
///
/// - `/` serves a 1256-byte document honouring single byte ranges
/// - `/echo` returns the forwarding-relevant request headers as JSON
/// - `/stats` answers with a marker so tests can tell it was forwarded
/// - `/slow` waits 10 seconds before answering
pub async fn start_origin() -> SocketAddr {
    let app = Router::new()
        .route("/", any(serve_document))
        .route("/echo", any(echo_headers))
        .route("/stats", get(|| async { "origin stats" }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                "too late"
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A proxy running on an ephemeral port.
pub struct RunningProxy {
    pub addr: SocketAddr,
    pub stats: Arc<StatsTracker>,
    pub shutdown: Shutdown,
}

impl RunningProxy {
    /// Client that sends every request through this proxy.
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .proxy(reqwest::Proxy::http(format!("http://{}", self.addr)).unwrap())
            .build()
            .unwrap()
    }

    /// Client that talks to the proxy itself.
    pub fn direct_client(&self) -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }
}

impl Drop for RunningProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_proxy(config: ProxyConfig) -> RunningProxy {
    let server = HttpServer::new(config);
    let stats = server.stats();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    RunningProxy {
        addr,
        stats,
        shutdown,
    }
}
