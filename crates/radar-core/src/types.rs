//! # Domain Types
//!
//! Core domain types used throughout Radar Config Sync.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────────┐   ┌──────────────────────────┐           │
//! │  │        Facility          │   │       ConfigField        │           │
//! │  │  ──────────────────────  │   │  ──────────────────────  │           │
//! │  │  id (UUID, immutable)    │   │  SplitAssignments        │           │
//! │  │  facility_identifier     │   │    → "radar-split"       │           │
//! │  │  split_assignments [..]  │   │  Notices                 │           │
//! │  │  notices [..]            │   │    → "notam"             │           │
//! │  └──────────────────────────┘   └──────────────────────────┘           │
//! │                                                                         │
//! │  ┌──────────────────────────┐                                          │
//! │  │       ChangeEvent        │  What a subscriber receives:             │
//! │  │  topic  "ZTL-notam"      │  the topic and the full committed list   │
//! │  │  lines  [..]             │                                          │
//! │  └──────────────────────────┘                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every facility has:
//! - `id`: UUID v4 - opaque, used by callers to address updates
//! - `facility_identifier`: short code ("ZTL") - used to derive topics
//!
//! Neither ever changes after provisioning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::topic::topic_for;

// =============================================================================
// Config Field
// =============================================================================

/// The list-valued fields of a facility that can be edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ConfigField {
    /// Radar split assignment lines.
    SplitAssignments,
    /// NOTAM text entries.
    Notices,
}

impl ConfigField {
    /// All editable fields, in display order.
    pub const ALL: [ConfigField; 2] = [ConfigField::SplitAssignments, ConfigField::Notices];

    /// Returns the fixed topic suffix for this field.
    ///
    /// These two tokens are the wire contract subscribers match against.
    pub const fn topic_suffix(&self) -> &'static str {
        match self {
            ConfigField::SplitAssignments => "radar-split",
            ConfigField::Notices => "notam",
        }
    }

    /// Returns the field name used in errors and logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigField::SplitAssignments => "split_assignments",
            ConfigField::Notices => "notices",
        }
    }
}

impl std::fmt::Display for ConfigField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConfigField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "split_assignments" | "split" | "radar-split" | "radar_split" => {
                Ok(ConfigField::SplitAssignments)
            }
            "notices" | "notams" | "notam" => Ok(ConfigField::Notices),
            other => Err(CoreError::UnknownField(other.to_string())),
        }
    }
}

// =============================================================================
// Facility
// =============================================================================

/// A radar facility with editable operational configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Facility {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Short human-readable code, e.g. "ZTL". Used to derive topics.
    pub facility_identifier: String,

    /// Ordered split assignment lines. Empty entries are meaningful.
    pub split_assignments: Vec<String>,

    /// Ordered NOTAM entries. Empty entries are meaningful.
    pub notices: Vec<String>,

    /// When the facility was provisioned.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When either list field was last written.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Facility {
    /// Creates a facility with a fresh UUID and empty lists.
    ///
    /// Provisioning is outside the sync core; this exists for seed tools
    /// and tests.
    pub fn new(facility_identifier: impl Into<String>) -> Self {
        let now = Utc::now();
        Facility {
            id: uuid::Uuid::new_v4().to_string(),
            facility_identifier: facility_identifier.into(),
            split_assignments: Vec::new(),
            notices: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the split assignments (builder style).
    pub fn with_split_assignments<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.split_assignments = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the notices (builder style).
    pub fn with_notices<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.notices = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the current value of one field.
    pub fn field(&self, field: ConfigField) -> &[String] {
        match field {
            ConfigField::SplitAssignments => &self.split_assignments,
            ConfigField::Notices => &self.notices,
        }
    }

    /// Replaces one field in place, leaving the other untouched.
    pub fn set_field(&mut self, field: ConfigField, lines: Vec<String>) {
        match field {
            ConfigField::SplitAssignments => self.split_assignments = lines,
            ConfigField::Notices => self.notices = lines,
        }
    }

    /// Returns the notification topic for one of this facility's fields.
    pub fn topic(&self, field: ConfigField) -> String {
        topic_for(&self.facility_identifier, field)
    }
}

// =============================================================================
// Change Event
// =============================================================================

/// A change notification as carried by a transport.
///
/// The payload is always the full committed list, never a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Transport topic, e.g. "ZTL-radar-split".
    pub topic: String,
    /// The committed list value.
    pub lines: Vec<String>,
}

impl ChangeEvent {
    /// Builds the event for one field of a committed facility record.
    pub fn for_facility(facility: &Facility, field: ConfigField) -> Self {
        ChangeEvent {
            topic: facility.topic(field),
            lines: facility.field(field).to_vec(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
