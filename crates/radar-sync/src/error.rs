//! # Sync Error Types
//!
//! Error types for the save-then-notify engine.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Caller         │  │   Store         │  │     Transport           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  NotFound       │  │  StoreUnavail.  │  │  Connection             │ │
//! │  │  InvalidArgument│  │  (retry whole   │  │  Publish                │ │
//! │  │  (never retry)  │  │   update)       │  │  Encode                 │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │    Config       │  │    Internal     │                              │
//! │  │                 │  │                 │                              │
//! │  │  Load / save /  │  │  Task join,     │                              │
//! │  │  validation     │  │  corrupt rows   │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A transport failure inside an update is not an error of the update: the
//! write stands and the service reports it through
//! [`UpdateOutcome::SavedNotPublished`](crate::service::UpdateOutcome).

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

// =============================================================================
// Transport Errors
// =============================================================================

/// Failure delivering a change notification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The transport could not reach its broker.
    #[error("Transport connection failed: {0}")]
    Connection(String),

    /// The broker rejected or dropped the publish.
    #[error("Publish to '{topic}' failed: {reason}")]
    Publish { topic: String, reason: String },

    /// The payload could not be encoded.
    #[error("Payload encoding failed: {0}")]
    Encode(String),
}

impl From<redis::RedisError> for TransportError {
    fn from(err: redis::RedisError) -> Self {
        TransportError::Connection(err.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Encode(err.to_string())
    }
}

// =============================================================================
// Sync Errors
// =============================================================================

/// Error type covering every failure a caller of the engine can observe.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Caller Errors
    // =========================================================================
    /// No facility with this ID (or identifier).
    #[error("Facility not found: {id}")]
    NotFound { id: String },

    /// Empty facility ID or a list that fails validation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // =========================================================================
    // Store Errors
    // =========================================================================
    /// Transient store failure. The write was not applied.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Publish failure outside an update (republish, hub relay).
    #[error(transparent)]
    Transport(#[from] TransportError),

    // =========================================================================
    // Ambient Errors
    // =========================================================================
    /// Configuration could not be loaded, saved or validated.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON encode/decode failure at a boundary.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Internal failure (task join, corrupt record).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Creates a NotFound error.
    pub fn not_found(id: impl Into<String>) -> Self {
        SyncError::NotFound { id: id.into() }
    }

    /// Returns true if the whole operation may be retried by the caller.
    ///
    /// Nothing in this crate retries automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::StoreUnavailable(_) | SyncError::Transport(_))
    }

    /// Short machine-readable kind, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::NotFound { .. } => "not_found",
            SyncError::InvalidArgument(_) => "invalid_argument",
            SyncError::StoreUnavailable(_) => "store_unavailable",
            SyncError::Transport(_) => "transport",
            SyncError::Config(_) => "config",
            SyncError::Serialization(_) => "serialization",
            SyncError::Internal(_) => "internal",
        }
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<radar_db::DbError> for SyncError {
    fn from(err: radar_db::DbError) -> Self {
        use radar_db::DbError;
        match err {
            DbError::NotFound { id, .. } => SyncError::NotFound { id },
            DbError::UniqueViolation { .. } => SyncError::InvalidArgument(err.to_string()),
            DbError::ConnectionFailed(_)
            | DbError::Busy(_)
            | DbError::PoolExhausted
            | DbError::QueryFailed(_) => SyncError::StoreUnavailable(err.to_string()),
            DbError::MigrationFailed(_) | DbError::CorruptRecord { .. } | DbError::Internal(_) => {
                SyncError::Internal(err.to_string())
            }
        }
    }
}

impl From<radar_core::CoreError> for SyncError {
    fn from(err: radar_core::CoreError) -> Self {
        use radar_core::CoreError;
        match err {
            CoreError::UnknownTopic(_) | CoreError::UnknownField(_) | CoreError::Validation(_) => {
                SyncError::InvalidArgument(err.to_string())
            }
        }
    }
}

impl From<radar_core::ValidationError> for SyncError {
    fn from(err: radar_core::ValidationError) -> Self {
        SyncError::InvalidArgument(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::Config(format!("Invalid URL: {}", err))
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::Config(err.to_string())
    }
}

impl From<tokio::task::JoinError> for SyncError {
    fn from(err: tokio::task::JoinError) -> Self {
        SyncError::Internal(format!("Update task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_core::{ConfigField, ValidationError};
    use radar_db::DbError;

    #[test]
    fn test_db_errors_map_to_taxonomy() {
        let not_found: SyncError = DbError::not_found("Facility", "XXX").into();
        assert!(matches!(not_found, SyncError::NotFound { ref id } if id == "XXX"));

        let busy: SyncError = DbError::Busy("database is locked".into()).into();
        assert!(matches!(busy, SyncError::StoreUnavailable(_)));
        assert!(busy.is_retryable());

        let corrupt: SyncError = DbError::CorruptRecord {
            id: "abc".into(),
            reason: "expected array".into(),
        }
        .into();
        assert!(matches!(corrupt, SyncError::Internal(_)));
        assert!(!corrupt.is_retryable());
    }

    #[test]
    fn test_validation_is_invalid_argument() {
        let err: SyncError = ValidationError::TooManyEntries {
            field: ConfigField::Notices.to_string(),
            max: 2,
            actual: 3,
        }
        .into();
        assert_eq!(err.kind(), "invalid_argument");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_transport_error_display() {
        let err = SyncError::from(TransportError::Publish {
            topic: "ZTL-notam".into(),
            reason: "broker gone".into(),
        });
        assert!(err.to_string().contains("ZTL-notam"));
        assert!(err.is_retryable());
    }
}
