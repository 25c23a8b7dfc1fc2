//! Configuration management for ChatRelay

pub mod settings;

pub use settings::{ClientConfig, ServerConfig, ServerSettings, StorageSettings};
