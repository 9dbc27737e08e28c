//! Per-server shutdown signal.

use tokio::sync::broadcast;

/// Broadcast handle that tells a server's accept loop to stop.
///
/// Owned by one server instance, so several servers can run in the same
/// process and be stopped independently.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        // No receivers means the accept loop is already gone.
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
