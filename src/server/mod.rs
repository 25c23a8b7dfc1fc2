//! ChatRelay server implementation

pub mod dispatcher;
pub mod framing;
pub mod handler;
pub mod registry;
pub mod state;
pub mod storage;
pub mod tcp;

use crate::config::ServerConfig;
use crate::Result;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

pub use dispatcher::BroadcastReport;
pub use framing::FrameReader;
pub use handler::{ConnectionHandler, ConnectionState};
pub use registry::{ClientHandle, ClientRegistry};
pub use state::ServerState;
pub use storage::LogStore;
pub use tcp::TcpRelayServer;

/// Main ChatRelay server that coordinates all components
pub struct ChatServer {
    config: ServerConfig,
    state: Arc<ServerState>,
    shutdown_tx: broadcast::Sender<()>,
}

impl ChatServer {
    /// Create a new server. The message log is truncated here, before any
    /// connection can be accepted.
    pub async fn new(config: ServerConfig) -> Result<Self> {
        config.validate()?;

        let store = LogStore::new(&config.storage.log_path);
        store.reset().await?;
        info!("Message log reset at {}", store.path().display());

        let state = Arc::new(ServerState::new(store, config.server.buffer_size));
        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            config,
            state,
            shutdown_tx,
        })
    }

    /// Bind the listener without starting the accept loop
    pub async fn listen(&self) -> Result<TcpRelayServer> {
        TcpRelayServer::bind(
            &self.config,
            Arc::clone(&self.state),
            self.shutdown_tx.subscribe(),
        )
        .await
    }

    /// Bind and run the accept loop until [`shutdown`](Self::shutdown)
    pub async fn start(&self) -> Result<()> {
        self.listen().await?.start().await
    }

    /// Ask every running accept loop to stop
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Shared server state
    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// Active configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
