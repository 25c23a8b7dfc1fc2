//! ChatRelay client for sending messages and receiving relayed traffic

use crate::config::ClientConfig;
use crate::server::framing::FrameReader;
use crate::types::HISTORY_KEYWORD;
use crate::{ChatRelayError, Result};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};
use tracing::debug;

struct Connection {
    reader: FrameReader,
    writer: OwnedWriteHalf,
}

/// Client for one ChatRelay server connection.
///
/// There is no automatic reconnection: once the connection is lost, every
/// call fails until [`reconnect`](Self::reconnect) succeeds.
pub struct ChatClient {
    config: ClientConfig,
    connection: Option<Connection>,
}

impl ChatClient {
    /// Connect to the server at `address` with default settings
    pub async fn connect(address: &str) -> Result<Self> {
        let config = ClientConfig {
            address: address.to_string(),
            ..Default::default()
        };

        Self::with_config(config).await
    }

    /// Connect with a custom configuration
    pub async fn with_config(config: ClientConfig) -> Result<Self> {
        let mut client = Self::new(config)?;
        client.reconnect().await?;
        Ok(client)
    }

    /// Create a client without connecting yet
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            connection: None,
        })
    }

    async fn open(config: &ClientConfig) -> Result<Connection> {
        let connect_future = TcpStream::connect(&config.address);
        let stream = timeout(Duration::from_secs(config.timeout_seconds), connect_future)
            .await
            .map_err(|_| ChatRelayError::Connection("Connection timeout".to_string()))?
            .map_err(|e| ChatRelayError::Connection(format!("Failed to connect: {}", e)))?;

        let (read_half, writer) = stream.into_split();
        Ok(Connection {
            reader: FrameReader::new(read_half, config.buffer_size),
            writer,
        })
    }

    /// Whether the client currently holds a live connection
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Server address this client talks to
    pub fn address(&self) -> &str {
        &self.config.address
    }

    /// Send raw text to the server
    pub async fn send(&mut self, text: &str) -> Result<()> {
        let conn = self
            .connection
            .as_mut()
            .ok_or_else(|| ChatRelayError::Connection("Not connected".to_string()))?;

        let sent = async {
            conn.writer.write_all(text.as_bytes()).await?;
            conn.writer.flush().await
        }
        .await;

        if let Err(e) = sent {
            self.connection = None;
            return Err(ChatRelayError::Connection(format!("Send failed: {}", e)));
        }
        Ok(())
    }

    /// Ask the server for the full message log
    pub async fn request_history(&mut self) -> Result<()> {
        self.send(HISTORY_KEYWORD).await
    }

    /// Wait for the next payload from the server.
    ///
    /// Payloads are framed exactly as on the server side, so one call may
    /// return several relayed messages glued together, or an empty string.
    pub async fn receive(&mut self) -> Result<String> {
        let conn = self
            .connection
            .as_mut()
            .ok_or_else(|| ChatRelayError::Connection("Not connected".to_string()))?;

        match conn.reader.next_message().await {
            Ok(payload) => Ok(payload),
            Err(e) => {
                debug!("Lost connection to {}: {}", self.config.address, e);
                self.connection = None;
                Err(e)
            }
        }
    }

    /// Drop any current connection and connect (again)
    pub async fn reconnect(&mut self) -> Result<()> {
        self.connection = None;
        self.connection = Some(Self::open(&self.config).await?);
        Ok(())
    }

    /// Close the connection to the server
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut conn) = self.connection.take() {
            conn.writer.shutdown().await.map_err(ChatRelayError::Io)?;
        }
        Ok(())
    }
}
