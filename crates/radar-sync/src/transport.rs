//! # Notification Transports
//!
//! Fire-and-forget topic publishing.
//!
//! ## Delivery Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    At-Most-Once Delivery                                │
//! │                                                                         │
//! │  publish("ZTL-notam", ["TFR in effect"])                               │
//! │       │                                                                 │
//! │       ├──► LocalBus (tokio broadcast)                                  │
//! │       │       ├──► session A  (subscribed, receives)                   │
//! │       │       ├──► session B  (lagging, skips missed, logs warn)       │
//! │       │       └──► nobody subscribed → Ok, event dropped               │
//! │       │                                                                 │
//! │       └──► RedisTransport                                              │
//! │               PUBLISH ZTL-notam '["TFR in effect"]'                    │
//! │               broker down → TransportError                             │
//! │                                                                         │
//! │  No ack, no replay, no persistence. Late subscribers fetch state.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use radar_core::ChangeEvent;
use redis::aio::ConnectionManager;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::TransportError;

// =============================================================================
// Transport Trait
// =============================================================================

/// Publishes a list payload to a topic.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Publishes the full list value to `topic`.
    async fn publish(&self, topic: &str, lines: &[String]) -> Result<(), TransportError>;
}

// =============================================================================
// In-Process Bus
// =============================================================================

/// In-process pub/sub on a tokio broadcast channel.
///
/// Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct LocalBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl LocalBus {
    /// Creates a bus where each subscriber buffers up to `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        LocalBus { tx }
    }

    /// Subscribes to every event published from now on.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl Transport for LocalBus {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn publish(&self, topic: &str, lines: &[String]) -> Result<(), TransportError> {
        let event = ChangeEvent {
            topic: topic.to_string(),
            lines: lines.to_vec(),
        };

        // Err only means nobody is listening
        match self.tx.send(event) {
            Ok(receivers) => debug!(topic = %topic, receivers, "Published to local bus"),
            Err(_) => debug!(topic = %topic, "Published to local bus with no subscribers"),
        }
        Ok(())
    }
}

/// A receiver on the [`LocalBus`].
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    /// Waits for the next event.
    ///
    /// A lagging subscriber skips what it missed and keeps going. Returns
    /// `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Local bus subscriber lagged, events dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

// =============================================================================
// Redis Transport
// =============================================================================

/// Redis `PUBLISH` transport.
///
/// The payload is the list encoded as a JSON array of strings. The
/// connection manager reconnects on its own between publishes; a publish
/// that fails is reported, not retried.
#[derive(Clone)]
pub struct RedisTransport {
    conn: ConnectionManager,
}

impl RedisTransport {
    /// Connects to the broker at `url`.
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        info!("Connected to Redis");
        Ok(RedisTransport { conn })
    }
}

#[async_trait]
impl Transport for RedisTransport {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn publish(&self, topic: &str, lines: &[String]) -> Result<(), TransportError> {
        let payload = encode_payload(lines)?;
        let mut conn = self.conn.clone();

        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(topic)
            .arg(payload)
            .query_async(&mut conn)
            .await
            .map_err(|e| TransportError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;

        debug!(topic = %topic, receivers, "Published to Redis");
        Ok(())
    }
}

/// Encodes a list payload for the wire.
pub fn encode_payload(lines: &[String]) -> Result<String, TransportError> {
    Ok(serde_json::to_string(lines)?)
}

/// Decodes a wire payload back into a list.
pub fn decode_payload(payload: &str) -> Result<Vec<String>, TransportError> {
    Ok(serde_json::from_str(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_succeeds() {
        let bus = LocalBus::new(8);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.publish("ZTL-notam", &lines(&["x"])).await.is_ok());
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_no_backfill() {
        let bus = LocalBus::new(8);
        bus.publish("ZTL-notam", &lines(&["old"])).await.unwrap();

        let mut sub = bus.subscribe();
        bus.publish("ZTL-notam", &lines(&["new"])).await.unwrap();

        let event = sub.recv().await.unwrap();
        assert_eq!(event.lines, lines(&["new"]));
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_and_continues() {
        let bus = LocalBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.publish("ZTL-radar-split", &[i.to_string()]).await.unwrap();
        }

        // Oldest events were overwritten; the newest ones remain in order
        let first = sub.recv().await.unwrap();
        let second = sub.recv().await.unwrap();
        assert_eq!(first.lines, vec!["3"]);
        assert_eq!(second.lines, vec!["4"]);
    }

    #[tokio::test]
    async fn test_subscription_ends_when_bus_dropped() {
        let bus = LocalBus::new(4);
        let mut sub = bus.subscribe();
        drop(bus);
        assert!(sub.recv().await.is_none());
    }

    #[test]
    fn test_payload_preserves_order_and_empty_entries() {
        let value = lines(&["North", "", "  East  "]);
        let wire = encode_payload(&value).unwrap();
        assert_eq!(wire, r#"["North","","  East  "]"#);
        assert_eq!(decode_payload(&wire).unwrap(), value);
        assert!(decode_payload("not json").is_err());
    }
}
