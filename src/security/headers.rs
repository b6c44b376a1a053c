//! Header manipulation for forwarded requests and relayed responses.
//!
//! # Responsibilities
//! - Add X-Forwarded-For, X-Forwarded-Proto
//! - Strip hop-by-hop headers in both directions
//! - Provide the provenance `Via` value, on relayed responses and on
//!   forwarded requests
//! - Detect requests that already went through this proxy
//!
//! # Design Decisions
//! - X-Forwarded-For is replaced with the connecting peer, never appended to
//! - Duplicate incoming headers collapse to the last value

use axum::http::header::{
    HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue, CONNECTION, PROXY_AUTHENTICATE,
    PROXY_AUTHORIZATION, RANGE, TE, TRAILER, TRANSFER_ENCODING, UPGRADE, VIA,
};
use std::net::IpAddr;

pub static X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub static X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
static KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");
static PROXY_CONNECTION: HeaderName = HeaderName::from_static("proxy-connection");

pub static VIA_VALUE: HeaderValue = HeaderValue::from_static("http/1.1 async http proxy");
static PROTO_HTTP: HeaderValue = HeaderValue::from_static("http");

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in named {
        headers.remove(name);
    }

    for name in [
        &CONNECTION,
        &KEEP_ALIVE,
        &PROXY_CONNECTION,
        &PROXY_AUTHENTICATE,
        &PROXY_AUTHORIZATION,
        &TE,
        &TRAILER,
        &TRANSFER_ENCODING,
        &UPGRADE,
    ] {
        headers.remove(name);
    }
}

/// Whether any `Via` entry on `headers` is this proxy's own.
pub fn has_passed_through(headers: &HeaderMap) -> bool {
    headers.get_all(VIA).iter().any(|v| *v == VIA_VALUE)
}

/// Header set sent to the origin for one request.
#[derive(Debug, Clone, Default)]
pub struct ProxiedHeaders(HeaderMap);

impl ProxiedHeaders {
    /// Copy the client's headers and add the forwarding headers.
    pub fn from_incoming(incoming: &HeaderMap, client_ip: Option<IpAddr>) -> Self {
        let mut headers = HeaderMap::with_capacity(incoming.keys_len() + 2);
        for (name, value) in incoming {
            headers.insert(name.clone(), value.clone());
        }
        strip_hop_by_hop(&mut headers);

        let forwarded_for = match client_ip {
            Some(ip) => HeaderValue::from_str(&ip.to_string()).unwrap_or(HeaderValue::from_static("")),
            None => HeaderValue::from_static(""),
        };
        headers.insert(X_FORWARDED_FOR.clone(), forwarded_for);
        headers.insert(X_FORWARDED_PROTO.clone(), PROTO_HTTP.clone());
        headers.append(VIA, VIA_VALUE.clone());

        Self(headers)
    }

    /// Replace the `Range` entry.
    pub fn set_range(&mut self, value: &str) -> Result<(), InvalidHeaderValue> {
        self.0.insert(RANGE, HeaderValue::from_str(value)?);
        Ok(())
    }

    pub fn range(&self) -> Option<&HeaderValue> {
        self.0.get(RANGE)
    }

    pub fn get(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.0.get(name)
    }

    pub fn into_inner(self) -> HeaderMap {
        self.0
    }
}
