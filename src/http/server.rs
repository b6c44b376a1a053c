//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the single catch-all handler
//! - Wire up middleware (tracing)
//! - Bind server to listener with peer address info
//! - Dispatch requests to the stats endpoint or the proxy pipeline
//! - Graceful shutdown

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::config::ProxyConfig;
use crate::http::request::{request_host, RequestId};
use crate::http::response::stats_response;
use crate::http::router::{RequestRouter, Route};
use crate::observability::{metrics, StatsTracker};
use crate::proxy::{Proxy, ProxyError};
use crate::security::LoopbackGuard;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: RequestRouter,
    pub proxy: Proxy,
    pub stats: Arc<StatsTracker>,
}

/// HTTP server for the forward proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    stats: Arc<StatsTracker>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// The stats clock starts here.
    pub fn new(config: ProxyConfig) -> Self {
        Self::with_stats(config, Arc::new(StatsTracker::new()))
    }

    /// Create a server that reports into an existing tracker.
    pub fn with_stats(config: ProxyConfig, stats: Arc<StatsTracker>) -> Self {
        let state = AppState {
            router: RequestRouter::new(
                LoopbackGuard::new(config.timeouts.connect()),
                config.stats.enabled,
            ),
            proxy: Proxy::new(&config.timeouts, stats.clone()),
            stats: stats.clone(),
        };

        let router = Self::build_router(state);
        Self {
            router,
            config,
            stats,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Forward-proxy targets are arbitrary URLs (and CONNECT authorities), so
    /// everything lands in the fallback handler.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(handle_request)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn stats(&self) -> Arc<StatsTracker> {
        self.stats.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Catch-all handler: one span per request, then dispatch.
async fn handle_request(State(state): State<AppState>, request: Request<Body>) -> Response {
    let span = tracing::info_span!(
        "request",
        request_id = %RequestId::new(),
        method = %request.method(),
        uri = %request.uri(),
    );
    dispatch(state, request).instrument(span).await
}

async fn dispatch(state: AppState, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let host = request_host(&request);

    let route = state
        .router
        .route(request.uri().path(), host.as_deref())
        .await;

    let response = match route {
        Route::Stats => stats_response(&state.stats),
        Route::Proxy => match state.proxy.handle(request).await {
            Ok(response) => response,
            Err(e) => {
                match &e {
                    ProxyError::Upstream(_) => tracing::warn!(error = %e, "Upstream error"),
                    _ => tracing::debug!(error = %e, "Request answered locally"),
                }
                e.into_response()
            }
        },
    };

    metrics::record_request(&method, response.status().as_u16(), start_time);
    response
}
