//! # radar-core: Pure Domain Logic for Radar Config Sync
//!
//! This crate holds the domain model for per-facility operational
//! configuration (radar split assignments and NOTAMs) as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Radar Config Sync Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               Operator UI / Controller Sessions                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / WebSocket                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                radar-sync (ConfigService, hub)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ radar-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   topic   │  │   lines   │  │ validation│  │   │
//! │  │   │ Facility  │  │ ZTL-notam │  │ split/join│  │ LineLimits│  │   │
//! │  │   │ConfigField│  │           │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Facility, ConfigField, ChangeEvent)
//! - [`topic`] - Notification topic derivation and parsing
//! - [`lines`] - Text-to-list codec used at the editing boundary
//! - [`validation`] - Facility ID and line list validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use radar_core::{topic_for, ConfigField};
//! use radar_core::lines::{join_lines, split_lines};
//!
//! let topic = topic_for("ZTL", ConfigField::SplitAssignments);
//! assert_eq!(topic, "ZTL-radar-split");
//!
//! let lines = split_lines("North\nSouth");
//! assert_eq!(lines, vec!["North", "South"]);
//! assert_eq!(join_lines(&lines), "North\nSouth");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod lines;
pub mod topic;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use topic::{parse_topic, topic_for};
pub use types::*;
pub use validation::LineLimits;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default maximum number of entries in one list field.
///
/// A split list or NOTAM board longer than this is almost certainly a paste
/// accident rather than an operational configuration.
pub const DEFAULT_MAX_LINES: usize = 256;

/// Default maximum length (in characters) of a single list entry.
pub const DEFAULT_MAX_LINE_LEN: usize = 512;
