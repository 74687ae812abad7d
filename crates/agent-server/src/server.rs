//! Server startup and graceful shutdown.

use agent_core::AgentError;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    router: Router,
}

impl Server {
    /// Bind-ready server for the given router.
    #[must_use]
    pub fn new(addr: SocketAddr, router: Router) -> Self {
        Self { addr, router }
    }

    /// Serve until a shutdown signal arrives.
    pub async fn run(self) -> Result<(), AgentError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| AgentError::internal(format!("Failed to bind {}: {e}", self.addr)))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| AgentError::internal(format!("Failed to read bound address: {e}")))?;
        info!(addr = %local_addr, "Agent gateway listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AgentError::internal(format!("Server error: {e}")))?;

        info!("Server shut down cleanly");
        Ok(())
    }
}

/// Resolves when SIGINT or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
