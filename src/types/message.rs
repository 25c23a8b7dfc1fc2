//! Message classification and connection identity

use std::fmt;
use uuid::Uuid;

/// Reserved payload that requests the full message log instead of being relayed.
pub const HISTORY_KEYWORD: &str = "GetHistory";

/// Identity of one accepted connection, assigned at accept time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh random connection id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First group of the hyphenated form is plenty for log lines.
        let full = self.0.hyphenated().to_string();
        write!(f, "{}", &full[..8])
    }
}

/// What a decoded payload means to the connection handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Empty or whitespace-only payload; dropped without side effects
    Empty,
    /// Exactly the history keyword
    HistoryRequest,
    /// Anything else, relayed verbatim
    Chat(String),
}

impl Inbound {
    /// Classify a decoded payload.
    ///
    /// The keyword must match the whole payload byte for byte; a keyword with
    /// surrounding whitespace is an ordinary chat message.
    pub fn classify(payload: String) -> Self {
        if payload.trim().is_empty() {
            Inbound::Empty
        } else if payload == HISTORY_KEYWORD {
            Inbound::HistoryRequest
        } else {
            Inbound::Chat(payload)
        }
    }
}
