//! TCP listener that spawns one handler task per connection

use crate::config::ServerConfig;
use crate::server::handler::ConnectionHandler;
use crate::server::state::ServerState;
use crate::{ChatRelayError, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Bound TCP listener for chat connections
pub struct TcpRelayServer {
    listener: TcpListener,
    state: Arc<ServerState>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl TcpRelayServer {
    /// Bind the configured address
    pub async fn bind(
        config: &ServerConfig,
        state: Arc<ServerState>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<Self> {
        let addr = config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ChatRelayError::Server(format!("Failed to bind {}: {}", addr, e)))?;

        Ok(Self {
            listener,
            state,
            shutdown_rx,
        })
    }

    /// Address actually bound, useful when the configured port is 0
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until shutdown is signalled
    pub async fn start(mut self) -> Result<()> {
        info!("Listening on {}", self.local_addr()?);

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let handler = ConnectionHandler::new(stream, peer, Arc::clone(&self.state));
                            tokio::spawn(handler.run());
                        }
                        Err(e) => {
                            warn!("Failed to accept connection: {}", e);
                        }
                    }
                }
                _ = self.shutdown_rx.recv() => {
                    info!("Listener shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}
