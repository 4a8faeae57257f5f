//! # Hub Protocol Messages
//!
//! Message types exchanged with controller sessions over `/ws`.
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Hub Protocol Messages                              │
//! │                                                                         │
//! │  SUBSCRIBE                                                             │
//! │  ─────────                                                             │
//! │  Session ───► Subscribe { topics: ["ZTL-radar-split"] }                │
//! │  Hub     ───► Snapshot { topic, lines }   (current committed value)    │
//! │                                                                         │
//! │  CHANGES                                                               │
//! │  ───────                                                               │
//! │  Hub     ───► Change { topic, lines }     (full list, never a diff)    │
//! │                                                                         │
//! │  UNSUBSCRIBE                                                           │
//! │  ───────────                                                           │
//! │  Session ───► Unsubscribe { topics }                                   │
//! │                                                                         │
//! │  KEEPALIVE                                                             │
//! │  ─────────                                                             │
//! │  Session ───► Ping                                                     │
//! │  Hub     ───► Pong                                                     │
//! │                                                                         │
//! │  ERROR                                                                 │
//! │  ─────                                                                 │
//! │  Hub     ───► Error { message }           (session stays open)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Adjacently tagged JSON:
//! ```json
//! { "type": "Change", "payload": { "topic": "ZTL-notam", "lines": ["TFR in effect"] } }
//! ```

use radar_core::ChangeEvent;
use serde::{Deserialize, Serialize};

use crate::error::SyncResult;

// =============================================================================
// Session → Hub
// =============================================================================

/// Messages a session sends to the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Start receiving changes for these topics.
    Subscribe { topics: Vec<String> },

    /// Stop receiving changes for these topics.
    Unsubscribe { topics: Vec<String> },

    /// Application-level keepalive.
    Ping,
}

impl ClientMessage {
    /// Parses a message from JSON text.
    pub fn from_json(text: &str) -> SyncResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

// =============================================================================
// Hub → Session
// =============================================================================

/// Messages the hub sends to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum HubMessage {
    /// Current committed value, sent once per subscribed topic.
    Snapshot { topic: String, lines: Vec<String> },

    /// A newly committed value.
    Change { topic: String, lines: Vec<String> },

    /// Reply to [`ClientMessage::Ping`].
    Pong,

    /// Request could not be served.
    Error { message: String },
}

impl HubMessage {
    /// Builds a snapshot message.
    pub fn snapshot(event: ChangeEvent) -> Self {
        HubMessage::Snapshot {
            topic: event.topic,
            lines: event.lines,
        }
    }

    /// Builds a change message.
    pub fn change(event: ChangeEvent) -> Self {
        HubMessage::Change {
            topic: event.topic,
            lines: event.lines,
        }
    }

    /// Builds an error message.
    pub fn error(message: impl Into<String>) -> Self {
        HubMessage::Error {
            message: message.into(),
        }
    }

    /// Serializes to JSON text.
    pub fn to_json(&self) -> SyncResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_wire_format() {
        let msg = ClientMessage::from_json(
            r#"{"type":"Subscribe","payload":{"topics":["ZTL-radar-split","ZTL-notam"]}}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Subscribe {
                topics: vec!["ZTL-radar-split".into(), "ZTL-notam".into()]
            }
        );

        assert_eq!(
            ClientMessage::from_json(r#"{"type":"Ping"}"#).unwrap(),
            ClientMessage::Ping
        );
        assert!(ClientMessage::from_json(r#"{"type":"Shout"}"#).is_err());
    }

    #[test]
    fn test_hub_message_wire_format() {
        let json = HubMessage::change(ChangeEvent {
            topic: "ZTL-notam".into(),
            lines: vec!["TFR in effect".into(), String::new()],
        })
        .to_json()
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "Change");
        assert_eq!(value["payload"]["topic"], "ZTL-notam");
        assert_eq!(value["payload"]["lines"][1], "");
    }
}
