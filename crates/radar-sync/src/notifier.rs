//! # Change Notifier
//!
//! Maps a committed field value to its topic and hands it to the transport.

use std::sync::Arc;

use radar_core::{ConfigField, Facility};
use tracing::{debug, error};

use crate::error::TransportError;
use crate::transport::Transport;

/// Publishes committed list values to their topics.
#[derive(Clone)]
pub struct ChangeNotifier {
    transport: Arc<dyn Transport>,
}

impl ChangeNotifier {
    /// Creates a notifier over a transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        ChangeNotifier { transport }
    }

    /// Publishes `lines` to `topic`.
    pub async fn publish(&self, topic: &str, lines: &[String]) -> Result<(), TransportError> {
        debug!(
            topic = %topic,
            lines = lines.len(),
            transport = self.transport.name(),
            "Publishing change"
        );

        self.transport.publish(topic, lines).await.map_err(|e| {
            error!(topic = %topic, error = %e, "Publish failed");
            e
        })
    }

    /// Publishes one field of a committed record to the field's topic.
    pub async fn publish_field(
        &self,
        facility: &Facility,
        field: ConfigField,
    ) -> Result<String, TransportError> {
        let topic = facility.topic(field);
        self.publish(&topic, facility.field(field)).await?;
        Ok(topic)
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("transport", &self.transport.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LocalBus;

    #[tokio::test]
    async fn test_publish_field_uses_derived_topic() {
        let bus = LocalBus::new(8);
        let mut sub = bus.subscribe();
        let notifier = ChangeNotifier::new(Arc::new(bus));

        let ztl = Facility::new("ZTL").with_notices(["TFR in effect"]);
        let topic = notifier
            .publish_field(&ztl, ConfigField::Notices)
            .await
            .unwrap();
        assert_eq!(topic, "ZTL-notam");

        let event = sub.recv().await.unwrap();
        assert_eq!(event.topic, "ZTL-notam");
        assert_eq!(event.lines, vec!["TFR in effect"]);
    }
}
