//! Core types shared by the server and the client

pub mod message;

pub use message::{ConnectionId, Inbound, HISTORY_KEYWORD};
