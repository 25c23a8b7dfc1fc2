//! ChatRelay client implementation

pub mod chat;

pub use chat::ChatClient;
pub use crate::types::HISTORY_KEYWORD;
