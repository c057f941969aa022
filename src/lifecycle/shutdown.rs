//! Shutdown coordination between the supervisor and the server loop.

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
#[derive(Debug)]
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half handed to a server loop.
///
/// Resolves once shutdown is triggered, or once the coordinator is gone.
#[derive(Debug)]
pub struct ShutdownListener {
    rx: broadcast::Receiver<()>,
}

impl ShutdownListener {
    /// Wait for shutdown. Suitable for `axum::serve(..).with_graceful_shutdown(..)`.
    pub async fn wait(mut self) {
        // Closed and Lagged both mean the sender has fired or gone away.
        let _ = self.rx.recv().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn trigger_wakes_every_listener() {
        let shutdown = Shutdown::new();
        let a = shutdown.subscribe();
        let b = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 2);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), async {
            a.wait().await;
            b.wait().await;
        })
        .await
        .expect("listeners should wake");
    }

    #[tokio::test]
    async fn dropping_coordinator_releases_listener() {
        let shutdown = Shutdown::new();
        let listener = shutdown.subscribe();
        drop(shutdown);
        tokio::time::timeout(Duration::from_secs(1), listener.wait())
            .await
            .expect("listener should resolve once the sender is gone");
    }

    #[tokio::test]
    async fn listener_pends_until_triggered() {
        let shutdown = Shutdown::new();
        let listener = shutdown.subscribe();
        let waited = tokio::time::timeout(Duration::from_millis(50), listener.wait()).await;
        assert!(waited.is_err());
    }
}
