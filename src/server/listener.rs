use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{Instrument, info, info_span};

use crate::config::Config;
use crate::http::connection::{Connection, Handler};
use crate::server::shutdown::Shutdown;

/// Pause after a failed accept before retrying.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A running server. Dropping it stops accepting new connections without
/// waiting for the accept loop; [`Server::close`] does the same and waits.
#[must_use = "dropping the server stops accepting connections"]
pub struct Server {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    accept_loop: JoinHandle<()>,
}

impl Server {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting new connections and waits for the accept loop to
    /// exit. Connections already being served run to completion.
    pub async fn close(self) -> anyhow::Result<()> {
        self.shutdown.trigger();
        self.accept_loop.await.context("accept loop panicked")?;
        info!(addr = %self.local_addr, "Server stopped");
        Ok(())
    }
}

/// Binds `cfg.listen_addr` and serves every connection with `handler` on
/// its own task.
pub async fn serve<H: Handler>(cfg: &Config, handler: H) -> anyhow::Result<Server> {
    let listener = TcpListener::bind(&cfg.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.listen_addr))?;
    let local_addr = listener.local_addr()?;
    info!("Listening on {}", local_addr);

    let shutdown = Shutdown::new();
    let accept_loop = tokio::spawn(accept_loop(
        listener,
        Arc::new(handler),
        cfg.read_buffer_size,
        shutdown.subscribe(),
    ));

    Ok(Server {
        local_addr,
        shutdown,
        accept_loop,
    })
}

async fn accept_loop<H: Handler>(
    listener: TcpListener,
    handler: Arc<H>,
    read_buffer_size: usize,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        let (socket, peer) = tokio::select! {
            signal = shutdown.recv() => {
                if signal.is_err() {
                    tracing::debug!("Server handle dropped");
                }
                break;
            }
            res = listener.accept() => match accepted_or_backoff(res).await {
                Some(accepted) => accepted,
                None => continue,
            },
        };
        tracing::debug!("Accepted connection from {}", peer);

        let handler = Arc::clone(&handler);
        let span = info_span!("connection", %peer);
        tokio::spawn(
            async move {
                let conn = Connection::new(socket, handler, read_buffer_size);
                if let Err(e) = conn.run().await {
                    tracing::error!("Connection error: {:#}", e);
                }
            }
            .instrument(span),
        );
    }
}

async fn accepted_or_backoff<T>(res: io::Result<T>) -> Option<T> {
    match res {
        Ok(accepted) => Some(accepted),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to accept connection");
            tokio::time::sleep(ACCEPT_BACKOFF).await;
            None
        }
    }
}
