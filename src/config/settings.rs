//! Configuration structures for ChatRelay

use crate::{ChatRelayError, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `CHATRELAY__SERVER__PORT=6000`
const ENV_PREFIX: &str = "CHATRELAY";

/// Server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener settings
    pub server: ServerSettings,
    /// Message log settings
    pub storage: StorageSettings,
}

/// Core server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Interface to bind to
    pub bind_address: String,
    /// TCP port to listen on
    pub port: u16,
    /// Buffer size for each socket read (bytes)
    pub buffer_size: usize,
    /// Accept port 0 and let the OS pick a free port
    pub allow_ephemeral_port: bool,
}

/// Message log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Path of the shared, sorted message log
    pub log_path: PathBuf,
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server address to connect to (`host:port`)
    pub address: String,
    /// Buffer size for each socket read (bytes)
    pub buffer_size: usize,
    /// Connection timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 5000,
            buffer_size: 1024,
            allow_ephemeral_port: false,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("chat.log"),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:5000".to_string(),
            buffer_size: 1024,
            timeout_seconds: 5,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a single TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ChatRelayError::Config(format!("Failed to read config file: {}", e)))?;

        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| ChatRelayError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an optional TOML file layered with
    /// `CHATRELAY__*` environment variables.
    ///
    /// The result is not validated so that callers can apply further
    /// overrides first.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(false));
        }

        let config = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 && !self.server.allow_ephemeral_port {
            return Err(ChatRelayError::Config("Port cannot be 0".to_string()));
        }
        if self.server.buffer_size == 0 {
            return Err(ChatRelayError::Config(
                "Buffer size must be greater than 0".to_string(),
            ));
        }
        if self.storage.log_path.as_os_str().is_empty() {
            return Err(ChatRelayError::Config("Log path cannot be empty".to_string()));
        }
        self.server.ip()?;
        Ok(())
    }

    /// Socket address the listener binds to
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(SocketAddr::new(self.server.ip()?, self.server.port))
    }
}

impl ServerSettings {
    fn ip(&self) -> Result<IpAddr> {
        self.bind_address.parse().map_err(|_| {
            ChatRelayError::Config(format!("Invalid bind address: {}", self.bind_address))
        })
    }
}

impl ClientConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.address.is_empty() {
            return Err(ChatRelayError::Config("Server address cannot be empty".to_string()));
        }
        if self.buffer_size == 0 {
            return Err(ChatRelayError::Config(
                "Buffer size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
