//! Delimiter-free message framing over a TCP read half
//!
//! There is no framing on the wire. A "message" is whatever bytes are
//! immediately available once the socket becomes readable, drained in
//! buffer-sized chunks. One call may therefore return half of what a peer
//! wrote, or several peer writes glued together.

use crate::{ChatRelayError, Result};
use bytes::BytesMut;
use std::io::ErrorKind;
use tokio::net::tcp::OwnedReadHalf;
use tracing::debug;

/// Reads delimiter-free UTF-8 payloads from a TCP stream
pub struct FrameReader {
    inner: OwnedReadHalf,
    chunk: Vec<u8>,
    pending: BytesMut,
}

impl FrameReader {
    /// Wrap a read half, reading at most `buffer_size` bytes per syscall
    pub fn new(inner: OwnedReadHalf, buffer_size: usize) -> Self {
        Self {
            inner,
            chunk: vec![0; buffer_size.max(1)],
            pending: BytesMut::new(),
        }
    }

    /// Wait for data and return everything that is available right now.
    ///
    /// Returns an empty string on a spurious wake-up, or when the only bytes
    /// available are the start of a multi-byte character. Returns
    /// [`ChatRelayError::Disconnected`] once the peer has closed the stream
    /// or the stream is broken.
    ///
    /// Cancel safe: the only await point is the readiness wait.
    pub async fn next_message(&mut self) -> Result<String> {
        if let Err(e) = self.inner.readable().await {
            debug!("Readiness wait failed: {}", e);
            return Err(ChatRelayError::Disconnected);
        }

        let mut acc = std::mem::take(&mut self.pending);
        let mut eof = false;

        loop {
            match self.inner.try_read(&mut self.chunk) {
                Ok(0) => {
                    eof = true;
                    break;
                }
                Ok(n) => acc.extend_from_slice(&self.chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!("Read failed: {}", e);
                    return Err(ChatRelayError::Disconnected);
                }
            }
        }

        if eof && acc.is_empty() {
            return Err(ChatRelayError::Disconnected);
        }

        Ok(self.decode(acc, eof))
    }

    /// Decode accumulated bytes, holding back a trailing partial character
    /// unless the stream has ended.
    fn decode(&mut self, mut bytes: BytesMut, flush: bool) -> String {
        if !flush {
            let tail = incomplete_tail_len(&bytes);
            if tail > 0 {
                self.pending = bytes.split_off(bytes.len() - tail);
            }
        }

        match std::str::from_utf8(&bytes) {
            Ok(text) => text.to_owned(),
            Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

/// Length of an unfinished multi-byte sequence at the end of `bytes`, or 0.
///
/// Earlier invalid bytes do not matter; only the last one to three bytes are
/// inspected.
fn incomplete_tail_len(bytes: &[u8]) -> usize {
    for len in 1..=bytes.len().min(3) {
        let tail = &bytes[bytes.len() - len..];
        match std::str::from_utf8(tail) {
            Err(e) if e.valid_up_to() == 0 && e.error_len().is_none() => return len,
            _ => {}
        }
    }
    0
}
