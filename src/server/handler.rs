//! Per-connection handler loop

use crate::server::dispatcher;
use crate::server::framing::FrameReader;
use crate::server::registry::ClientHandle;
use crate::server::state::ServerState;
use crate::types::Inbound;
use crate::Result;
use chrono::Utc;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tracing::{debug, error, info, trace};

/// Where a connection is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Waiting for the next payload
    Connected,
    /// Sending the log back to this client
    ServingHistory,
    /// Appending a chat message to the log
    Persisting,
    /// Relaying a chat message to every client
    Broadcasting,
    /// Stream is dead; terminal
    Disconnected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::ServingHistory => write!(f, "serving-history"),
            ConnectionState::Persisting => write!(f, "persisting"),
            ConnectionState::Broadcasting => write!(f, "broadcasting"),
            ConnectionState::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Owns one accepted connection until its stream dies
pub struct ConnectionHandler {
    handle: ClientHandle,
    reader: FrameReader,
    shared: Arc<ServerState>,
    state: ConnectionState,
    #[cfg(test)]
    trail: Vec<ConnectionState>,
}

impl ConnectionHandler {
    /// Split an accepted stream into a framed reader and a shareable writer
    pub fn new(stream: TcpStream, peer: SocketAddr, shared: Arc<ServerState>) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            handle: ClientHandle::new(peer, write_half),
            reader: FrameReader::new(read_half, shared.buffer_size),
            shared,
            state: ConnectionState::Connected,
            #[cfg(test)]
            trail: Vec::new(),
        }
    }

    /// Handle for this connection's write side
    pub fn handle(&self) -> &ClientHandle {
        &self.handle
    }

    /// Register, serve payloads until the stream dies, then deregister
    pub async fn run(mut self) {
        let id = self.handle.id();
        self.shared.registry.add(self.handle.clone());
        info!(
            "Client {} connected from {} ({} online)",
            id,
            self.handle.peer(),
            self.shared.registry.len()
        );

        loop {
            let payload = match self.reader.next_message().await {
                Ok(payload) => payload,
                Err(_) => break,
            };

            if let Err(e) = self.process(payload).await {
                debug!("Client {} fault: {}", id, e);
                break;
            }
        }

        self.transition(ConnectionState::Disconnected);
        self.shared.registry.remove(id);

        let session = Utc::now() - self.handle.connected_at();
        info!(
            "Client {} disconnected after {}s ({} online)",
            id,
            session.num_seconds(),
            self.shared.registry.len()
        );
    }

    /// Act on one payload. An error means the connection is dead.
    async fn process(&mut self, payload: String) -> Result<()> {
        match Inbound::classify(payload) {
            Inbound::Empty => Ok(()),
            Inbound::HistoryRequest => {
                self.transition(ConnectionState::ServingHistory);
                let result = self.serve_history().await;
                self.transition(ConnectionState::Connected);
                result
            }
            Inbound::Chat(message) => {
                self.transition(ConnectionState::Persisting);
                if let Err(e) = self.shared.store.append(&message).await {
                    error!(
                        "Failed to persist message from {}: {}",
                        self.handle.id(),
                        e
                    );
                    self.transition(ConnectionState::Connected);
                    return Ok(());
                }

                self.transition(ConnectionState::Broadcasting);
                let targets = self.shared.registry.snapshot();
                let report = dispatcher::broadcast(&message, &targets).await;
                debug!(
                    "Relayed {} bytes from {}: {} delivered, {} failed",
                    message.len(),
                    self.handle.id(),
                    report.delivered,
                    report.failed
                );

                self.transition(ConnectionState::Connected);
                Ok(())
            }
        }
    }

    async fn serve_history(&self) -> Result<()> {
        let history = match self.shared.store.read_all().await {
            Ok(history) => history,
            Err(e) => {
                error!("Failed to read history for {}: {}", self.handle.id(), e);
                return Ok(());
            }
        };

        dispatcher::send_to(&self.handle, &history).await
    }

    fn transition(&mut self, next: ConnectionState) {
        trace!("Client {}: {} -> {}", self.handle.id(), self.state, next);
        self.state = next;
        #[cfg(test)]
        self.trail.push(next);
    }
}
