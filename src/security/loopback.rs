//! Loopback check guarding the `/stats` endpoint.
//!
//! Resolves the `host[:port]` a request names (DNS or IP literal) and reports
//! whether it lands on a loopback address. Resolution is the only suspension
//! point and is bounded by a timeout.

use axum::http::uri::Authority;
use std::net::IpAddr;
use std::time::Duration;

use crate::resilience::timeouts::{with_timeout, TimeoutError};

const DEFAULT_PORT: u16 = 80;

/// Why a host could not be classified.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("malformed host {host:?}")]
    Malformed { host: String },

    #[error("failed to resolve {host}: {source}")]
    Lookup {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{host} resolved to no addresses")]
    NoAddresses { host: String },

    #[error(transparent)]
    Timeout(#[from] TimeoutError),
}

/// Resolves hosts and classifies them as loopback or not.
#[derive(Debug, Clone)]
pub struct LoopbackGuard {
    timeout: Duration,
}

impl LoopbackGuard {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Whether `host_port` resolves to a loopback address.
    ///
    /// When a name resolves to several addresses the last one decides.
    pub async fn is_loopback(&self, host_port: &str) -> Result<bool, ResolutionError> {
        let authority: Authority = host_port.parse().map_err(|_| ResolutionError::Malformed {
            host: host_port.to_string(),
        })?;
        let host = authority.host().trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(ResolutionError::Malformed {
                host: host_port.to_string(),
            });
        }
        let port = authority.port_u16().unwrap_or(DEFAULT_PORT);

        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(is_loopback_ip(ip));
        }

        let addrs = with_timeout(
            "host resolution",
            self.timeout,
            tokio::net::lookup_host((host, port)),
        )
        .await?
        .map_err(|source| ResolutionError::Lookup {
            host: host.to_string(),
            source,
        })?;

        addrs
            .last()
            .map(|addr| is_loopback_ip(addr.ip()))
            .ok_or_else(|| ResolutionError::NoAddresses {
                host: host.to_string(),
            })
    }
}

/// `127.0.0.0/8`, `::1`, or an IPv4-mapped form of the former.
pub fn is_loopback_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_loopback(),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.is_loopback(),
            None => v6.is_loopback(),
        },
    }
}
