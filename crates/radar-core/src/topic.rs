//! # Topic Derivation
//!
//! Maps a (facility identifier, field) pair to the transport topic string and
//! back. Publishers and subscribers both go through this module, so the two
//! sides cannot drift apart.
//!
//! ```text
//!   ("ZTL", SplitAssignments)  ──topic_for──►  "ZTL-radar-split"
//!   ("ZTL", Notices)           ──topic_for──►  "ZTL-notam"
//!
//!   "ZTL-radar-split"          ──parse_topic─►  ("ZTL", SplitAssignments)
//! ```

use crate::error::{CoreError, CoreResult};
use crate::types::ConfigField;

/// Derives the topic for a facility field: `"{facility_identifier}-{suffix}"`.
pub fn topic_for(facility_identifier: &str, field: ConfigField) -> String {
    format!("{}-{}", facility_identifier, field.topic_suffix())
}

/// Splits a topic back into its facility identifier and field.
///
/// Suffix matching is done from the end, so facility identifiers that
/// themselves contain hyphens parse correctly.
pub fn parse_topic(topic: &str) -> CoreResult<(&str, ConfigField)> {
    for field in ConfigField::ALL {
        if let Some(prefix) = topic
            .strip_suffix(field.topic_suffix())
            .and_then(|rest| rest.strip_suffix('-'))
        {
            if !prefix.is_empty() {
                return Ok((prefix, field));
            }
        }
    }

    Err(CoreError::UnknownTopic(topic.to_string()))
}
