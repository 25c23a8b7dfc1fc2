//! Best-effort fan-out of messages to connected clients

use crate::server::registry::ClientHandle;
use crate::Result;
use tracing::debug;

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Targets the message was written to
    pub delivered: usize,
    /// Targets whose write failed
    pub failed: usize,
}

/// Write `message` to every target in order.
///
/// A failed write is swallowed. The dispatcher never deregisters anyone; the
/// failing connection's own handler notices the broken stream on its next
/// read and cleans up after itself.
///
/// There is no write timeout. A peer that stays connected but stops reading
/// fills its socket buffer, and the write to it then waits indefinitely while
/// holding that client's writer lock. Targets after it in `targets` are not
/// reached until it drains, and the sending handler does not read its next
/// payload in the meantime.
pub async fn broadcast(message: &str, targets: &[ClientHandle]) -> BroadcastReport {
    let bytes = message.as_bytes();
    let mut report = BroadcastReport::default();

    for target in targets {
        match target.write(bytes).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                debug!("Broadcast to {} ({}) failed: {}", target.id(), target.peer(), e);
                report.failed += 1;
            }
        }
    }

    report
}

/// Write `message` to a single client, propagating failure
pub async fn send_to(target: &ClientHandle, message: &str) -> Result<()> {
    target.write(message.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChatRelayError;
    use tokio::io::{AsyncReadExt, DuplexStream};
    use tokio::time::{timeout, Duration};

    fn target() -> (ClientHandle, DuplexStream) {
        let (ours, theirs) = tokio::io::duplex(1024);
        (ClientHandle::new("127.0.0.1:9".parse().unwrap(), ours), theirs)
    }

    async fn read_exactly(peer: &mut DuplexStream, len: usize) -> String {
        let mut buf = vec![0u8; len];
        peer.read_exact(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_target() {
        let (a, mut a_peer) = target();
        let (b, mut b_peer) = target();
        let (c, mut c_peer) = target();

        let report = broadcast("hello", &[a, b, c]).await;

        assert_eq!(report, BroadcastReport { delivered: 3, failed: 0 });
        assert_eq!(read_exactly(&mut a_peer, 5).await, "hello");
        assert_eq!(read_exactly(&mut b_peer, 5).await, "hello");
        assert_eq!(read_exactly(&mut c_peer, 5).await, "hello");
    }

    #[tokio::test]
    async fn test_broadcast_tolerates_dead_target() {
        let (a, mut a_peer) = target();
        let (dead, dead_peer) = target();
        let (c, mut c_peer) = target();
        drop(dead_peer);

        let report = broadcast("still here", &[a, dead, c]).await;

        assert_eq!(report, BroadcastReport { delivered: 2, failed: 1 });
        assert_eq!(read_exactly(&mut a_peer, 10).await, "still here");
        assert_eq!(read_exactly(&mut c_peer, 10).await, "still here");
    }

    #[tokio::test]
    async fn test_broadcast_preserves_utf8_bytes() {
        let (a, mut a_peer) = target();
        let message = "привет, мир";

        broadcast(message, &[a]).await;

        assert_eq!(read_exactly(&mut a_peer, message.len()).await, message);
    }

    #[tokio::test]
    async fn test_stalled_target_holds_up_later_targets() {
        let (a, mut a_peer) = target();
        let (ours, mut stalled_peer) = tokio::io::duplex(4);
        let stalled = ClientHandle::new("127.0.0.1:9".parse().unwrap(), ours);
        let (c, mut c_peer) = target();

        let pending = tokio::spawn(async move { broadcast("overflowing", &[a, stalled, c]).await });

        assert_eq!(read_exactly(&mut a_peer, 11).await, "overflowing");
        let mut buf = [0u8; 1];
        assert!(timeout(Duration::from_millis(100), c_peer.read(&mut buf))
            .await
            .is_err());

        // Draining the stalled peer lets the broadcast finish
        assert_eq!(read_exactly(&mut stalled_peer, 11).await, "overflowing");
        assert_eq!(read_exactly(&mut c_peer, 11).await, "overflowing");
        let report = pending.await.unwrap();
        assert_eq!(report, BroadcastReport { delivered: 3, failed: 0 });
    }

    #[tokio::test]
    async fn test_broadcast_to_nobody() {
        assert_eq!(broadcast("anyone?", &[]).await, BroadcastReport::default());
    }

    #[tokio::test]
    async fn test_send_to_propagates_failure() {
        let (a, a_peer) = target();
        drop(a_peer);

        assert!(matches!(
            send_to(&a, "history").await,
            Err(ChatRelayError::Disconnected)
        ));
    }
}
