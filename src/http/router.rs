//! Stats-or-proxy dispatch.
//!
//! A request is served locally only when its path is `/stats` and the host it
//! names resolves to loopback. Everything else, including `/stats` for a
//! remote host or an unresolvable one, is proxied.

use crate::security::LoopbackGuard;

pub const STATS_PATH: &str = "/stats";

/// Where a request is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Stats,
    Proxy,
}

#[derive(Debug, Clone)]
pub struct RequestRouter {
    loopback: LoopbackGuard,
    stats_enabled: bool,
}

impl RequestRouter {
    pub fn new(loopback: LoopbackGuard, stats_enabled: bool) -> Self {
        Self {
            loopback,
            stats_enabled,
        }
    }

    /// Decide the route for a request with `path` naming `host`.
    pub async fn route(&self, path: &str, host: Option<&str>) -> Route {
        if !self.stats_enabled || path != STATS_PATH {
            return Route::Proxy;
        }

        let Some(host) = host else {
            tracing::debug!("Stats request without a host; proxying");
            return Route::Proxy;
        };

        match self.loopback.is_loopback(host).await {
            Ok(true) => Route::Stats,
            Ok(false) => {
                tracing::debug!(host = %host, "Stats request for non-loopback host; proxying");
                Route::Proxy
            }
            Err(e) => {
                tracing::warn!(host = %host, error = %e, "Could not resolve stats host; proxying");
                Route::Proxy
            }
        }
    }
}
