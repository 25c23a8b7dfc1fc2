//! Registry of live client connections

use crate::types::ConnectionId;
use crate::{ChatRelayError, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Shareable handle to the write side of one client connection.
///
/// Cloning is cheap; all clones write through the same locked writer, so a
/// history reply and a concurrent broadcast never interleave within a write.
#[derive(Clone)]
pub struct ClientHandle {
    id: ConnectionId,
    peer: SocketAddr,
    connected_at: DateTime<Utc>,
    writer: Arc<tokio::sync::Mutex<BoxedWriter>>,
}

impl ClientHandle {
    /// Create a handle for a freshly accepted connection
    pub fn new<W>(peer: SocketAddr, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            id: ConnectionId::new(),
            peer,
            connected_at: Utc::now(),
            writer: Arc::new(tokio::sync::Mutex::new(Box::new(writer))),
        }
    }

    /// Connection id
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Remote peer address
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// When the connection was accepted
    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Write the whole buffer to the peer.
    ///
    /// Any failure means the stream is unusable and is reported as
    /// [`ChatRelayError::Disconnected`].
    pub async fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer
            .write_all(bytes)
            .await
            .map_err(|_| ChatRelayError::Disconnected)?;
        writer.flush().await.map_err(|_| ChatRelayError::Disconnected)
    }
}

impl std::fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHandle")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("connected_at", &self.connected_at)
            .finish_non_exhaustive()
    }
}

/// Set of connections currently believed alive.
///
/// One lock guards every operation. The lock is never held across an await;
/// callers that need to do I/O take a [`snapshot`](Self::snapshot) first.
#[derive(Default)]
pub struct ClientRegistry {
    clients: Mutex<Vec<ClientHandle>>,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection
    pub fn add(&self, handle: ClientHandle) {
        self.clients.lock().push(handle);
    }

    /// Deregister a connection. Returns `false` if it was not registered.
    pub fn remove(&self, id: ConnectionId) -> bool {
        let mut clients = self.clients.lock();
        match clients.iter().position(|c| c.id == id) {
            Some(index) => {
                clients.remove(index);
                true
            }
            None => false,
        }
    }

    /// Copy of the current members, in registration order
    pub fn snapshot(&self) -> Vec<ClientHandle> {
        self.clients.lock().clone()
    }

    /// Whether a connection is registered
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.clients.lock().iter().any(|c| c.id == id)
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    /// Whether no connections are registered
    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }
}
