//! # ChatRelay - Minimal TCP Chat Relay
//!
//! ChatRelay accepts many concurrent TCP connections, broadcasts every text
//! message it receives to all connected clients, and keeps every message in a
//! single sorted log file that any client can request in full.
//!
//! ## Features
//!
//! - **Raw Byte Protocol**: UTF-8 text over plain TCP, no delimiters or length prefixes
//! - **Broadcast**: Every non-empty message is relayed to all connected peers
//! - **Sorted History**: The log file is re-sorted on every append
//! - **History On Demand**: Sending `GetHistory` returns the whole log to the requester
//! - **Async I/O**: One Tokio task per connection, no CPU spin on idle peers
//!
//! ## Quick Start
//!
//! ### Server
//! ```no_run
//! use chatrelay::config::ServerConfig;
//! use chatrelay::server::ChatServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::from_file("config/server.toml")?;
//!     let server = ChatServer::new(config).await?;
//!     server.start().await?;
//!     Ok(())
//! }
//! ```
//!
//! ### Client
//! ```no_run
//! use chatrelay::client::ChatClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = ChatClient::connect("127.0.0.1:5000").await?;
//!
//!     client.send("hello").await?;
//!     client.request_history().await?;
//!     println!("{}", client.receive().await?);
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod server;
pub mod types;

/// Common error types used throughout ChatRelay
pub mod error {
    use thiserror::Error;

    /// ChatRelay error types
    #[derive(Debug, Error)]
    pub enum ChatRelayError {
        /// I/O operation failed
        #[error("I/O error: {0}")]
        Io(#[from] std::io::Error),
        /// Configuration error
        #[error("Configuration error: {0}")]
        Config(String),
        /// Server error
        #[error("Server error: {0}")]
        Server(String),
        /// Client connection error
        #[error("Connection error: {0}")]
        Connection(String),
        /// The peer closed the stream or the stream broke
        #[error("peer disconnected")]
        Disconnected,
    }

    impl From<toml::de::Error> for ChatRelayError {
        fn from(err: toml::de::Error) -> Self {
            ChatRelayError::Config(err.to_string())
        }
    }

    impl From<::config::ConfigError> for ChatRelayError {
        fn from(err: ::config::ConfigError) -> Self {
            ChatRelayError::Config(err.to_string())
        }
    }

    /// Result type alias for ChatRelay operations
    pub type Result<T> = std::result::Result<T, ChatRelayError>;
}

pub use error::{ChatRelayError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::ChatClient;
    pub use crate::config::{ClientConfig, ServerConfig};
    pub use crate::server::ChatServer;
    pub use crate::types::{ConnectionId, Inbound, HISTORY_KEYWORD};
    pub use crate::{ChatRelayError, Result};
}
