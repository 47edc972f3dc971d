//! Print server lifecycle — bind → spawn → graceful shutdown.
//!
//! Pattern: bind the listener (ephemeral port allowed), spawn `axum::serve`
//! in a background task, return a handle carrying the bound address and a
//! oneshot shutdown channel.

use std::net::SocketAddr;

use tokio::sync::oneshot;

use crate::api::router::print_api_router;
use crate::api::types::ApiContext;

/// Handle to a running print server.
pub struct PrintServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl PrintServer {
    /// Shut down the server gracefully. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("print server shutdown signal sent");
        }
    }
}

/// Start the print server on `addr` (port 0 ⇒ ephemeral).
pub async fn start_print_server(
    ctx: ApiContext,
    addr: SocketAddr,
) -> Result<PrintServer, String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind print server on {addr}: {e}"))?;
    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    let app = print_api_router(ctx);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("print server received shutdown signal");
        };

        tracing::info!(%addr, "print server started");
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("print server error: {e}");
        }
        tracing::info!("print server stopped");
    });

    Ok(PrintServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
    })
}
