//! Shared server state

use crate::server::registry::ClientRegistry;
use crate::server::storage::LogStore;

/// State shared by every connection handler for the lifetime of the server
pub struct ServerState {
    /// Live connections
    pub registry: ClientRegistry,
    /// Sorted message log
    pub store: LogStore,
    /// Per-read buffer size for framing
    pub buffer_size: usize,
}

impl ServerState {
    /// Bundle a fresh registry with the given store
    pub fn new(store: LogStore, buffer_size: usize) -> Self {
        Self {
            registry: ClientRegistry::new(),
            store,
            buffer_size,
        }
    }
}
