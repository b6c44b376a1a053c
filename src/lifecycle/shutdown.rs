//! Stop signal shared by the listener and whoever owns the proxy.
//!
//! The binary triggers it from SIGINT/SIGTERM; embedders (and the
//! integration harness) trigger it directly to stop a proxy bound to an
//! ephemeral port. `HttpServer::run` stops accepting on the first trigger and
//! lets in-flight relays finish.

use tokio::sync::broadcast;

/// Cloneable handle to the stop signal.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// A receiver for one server; take it before the server starts.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every subscribed server to stop. Idempotent, and a no-op once all
    /// servers are gone.
    pub fn trigger(&self) {
        if self.tx.send(()).is_err() {
            tracing::debug!("Stop requested with no running server");
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_is_notified() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.clone().subscribe();

        shutdown.trigger();
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }

    #[test]
    fn trigger_without_servers_is_harmless() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.trigger();
    }
}
