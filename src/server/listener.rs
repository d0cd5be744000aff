use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::server::registry::Registry;
use crate::server::session::{Session, SessionId};

/// TCP server accepting chat clients.
pub struct Server {
    listener: TcpListener,
    next_id: AtomicU64,
    registry: Arc<Registry>,
}

impl Server {
    /// Creates a new server with a given listener and an empty registry.
    pub fn new(listener: TcpListener) -> Self {
        Self::with_registry(listener, Arc::new(Registry::new()))
    }

    /// Creates a new server whose sessions join `registry`.
    pub fn with_registry(listener: TcpListener, registry: Arc<Registry>) -> Self {
        Self {
            listener,
            next_id: AtomicU64::new(1),
            registry,
        }
    }

    /// The registry shared by every session of this server.
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever.
    pub async fn serve(self) {
        self.serve_with_shutdown(std::future::pending::<()>()).await
    }

    /// Accepts connections until `shutdown` resolves.
    ///
    /// A failed accept is logged and the loop keeps going. Sessions already
    /// running are not waited for.
    pub async fn serve_with_shutdown<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let (socket, peer_addr) = tokio::select! {
                res = self.listener.accept() => match res {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                        continue;
                    }
                },
                _ = &mut shutdown => {
                    info!("Stopped accepting connections");
                    return;
                }
            };

            let id = SessionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
            debug!(%id, %peer_addr, "Accepted connection");

            Session::start(socket, id, self.registry.clone());
        }
    }
}
