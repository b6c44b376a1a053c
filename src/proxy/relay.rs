//! Streaming of origin responses back to the client.
//!
//! The origin body is drained by a dedicated task in chunks of at most
//! [`MAX_CHUNK_SIZE`] bytes and pushed through a bounded channel that backs
//! the client's response body. The channel is the write sink: a send that
//! fails means the client went away, and the task then drops the origin body
//! so the upstream connection is released instead of drained.

use axum::body::Body;
use axum::http::{
    header::{CONTENT_LENGTH, VIA},
    HeaderMap, Response,
};
use bytes::Bytes;
use futures_util::Stream;
use http_body_util::BodyExt;
use hyper::body::Body as HttpBody;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::observability::{metrics, StatsTracker};
use crate::resilience::timeouts::with_timeout;
use crate::security::headers::{strip_hop_by_hop, VIA_VALUE};

/// Largest chunk written to the client in one piece.
pub const MAX_CHUNK_SIZE: usize = 1024;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What the relay task hands to the client body.
#[derive(Debug)]
enum RelayEvent {
    Chunk(Bytes),
    Eof,
    Failed(io::Error),
}

/// Copies origin responses to clients and accounts relayed bytes.
#[derive(Debug, Clone)]
pub struct ResponseRelay {
    stats: Arc<StatsTracker>,
    idle_timeout: Duration,
}

impl ResponseRelay {
    pub fn new(stats: Arc<StatsTracker>, idle_timeout: Duration) -> Self {
        Self {
            stats,
            idle_timeout,
        }
    }

    /// Turn an origin response into the client response.
    ///
    /// Status and headers are copied, hop-by-hop headers dropped and `Via`
    /// added. The declared `Content-Length` is added to the byte counter once,
    /// before any body bytes move; the streamed total is not measured.
    pub fn relay<B>(&self, upstream: Response<B>) -> Response<Body>
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError> + Send,
    {
        let (mut parts, body) = upstream.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        parts.headers.insert(VIA, VIA_VALUE.clone());

        let declared = declared_length(&parts.headers);
        self.stats.record_bytes(declared);
        metrics::record_bytes(declared);

        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(pump(body, tx, self.idle_timeout));

        Response::from_parts(parts, Body::from_stream(client_stream(rx)))
    }
}

/// Declared `Content-Length`, or 0 when absent or unparsable.
fn declared_length(headers: &HeaderMap) -> u64 {
    match headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
    {
        Some(length) => length,
        None => {
            tracing::debug!("Upstream response has no usable Content-Length; counting 0 bytes");
            0
        }
    }
}

/// Drain `body` into `tx` until end of body, failure, or client disconnect.
async fn pump<B>(body: B, tx: mpsc::Sender<RelayEvent>, idle: Duration)
where
    B: HttpBody<Data = Bytes> + Send,
    B::Error: Into<BoxError> + Send,
{
    tokio::pin!(body);

    loop {
        let frame = tokio::select! {
            _ = tx.closed() => {
                tracing::debug!("Client disconnected; releasing upstream body");
                return;
            }
            frame = with_timeout("upstream read", idle, body.frame()) => frame,
        };

        let frame = match frame {
            Ok(Some(Ok(frame))) => frame,
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                let e = io::Error::other(e);
                tracing::warn!(error = %e, "Upstream body failed mid-stream");
                send(&tx, RelayEvent::Failed(e), idle).await;
                return;
            }
            Err(timeout) => {
                tracing::warn!(error = %timeout, "Upstream stalled mid-stream");
                let e = io::Error::new(io::ErrorKind::TimedOut, timeout);
                send(&tx, RelayEvent::Failed(e), idle).await;
                return;
            }
        };

        // Trailers are not relayed.
        let Ok(mut data) = frame.into_data() else {
            continue;
        };
        while !data.is_empty() {
            let chunk = data.split_to(data.len().min(MAX_CHUNK_SIZE));
            if !send(&tx, RelayEvent::Chunk(chunk), idle).await {
                return;
            }
        }
    }

    send(&tx, RelayEvent::Eof, idle).await;
}

/// Push one event to the client side. False when the client is gone or stalled.
async fn send(tx: &mpsc::Sender<RelayEvent>, event: RelayEvent, idle: Duration) -> bool {
    match with_timeout("client write", idle, tx.send(event)).await {
        Ok(Ok(())) => true,
        Ok(Err(_)) => {
            tracing::debug!("Client disconnected; releasing upstream body");
            false
        }
        Err(timeout) => {
            tracing::warn!(error = %timeout, "Client stalled; aborting relay");
            false
        }
    }
}

/// Client body fed by the relay task. Ends cleanly only on an explicit end
/// of body; a task that stops early surfaces as an error so the client never
/// mistakes a truncated body for a complete one.
fn client_stream(rx: mpsc::Receiver<RelayEvent>) -> impl Stream<Item = Result<Bytes, io::Error>> {
    futures_util::stream::unfold(Some(rx), |rx| async move {
        let mut rx = rx?;
        match rx.recv().await {
            Some(RelayEvent::Chunk(chunk)) => Some((Ok(chunk), Some(rx))),
            Some(RelayEvent::Eof) => None,
            Some(RelayEvent::Failed(e)) => Some((Err(e), None)),
            None => Some((
                Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "relay stopped before end of body",
                )),
                None,
            )),
        }
    })
}
