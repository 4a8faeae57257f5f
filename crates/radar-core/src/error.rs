//! # Error Types
//!
//! Domain-specific error types for radar-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  radar-core errors (this file)                                         │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  radar-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  radar-sync errors (separate crate)                                    │
//! │  └── SyncError        - What callers of ConfigService see              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SyncError → HTTP status           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Topic string does not end in a known field suffix.
    ///
    /// ## When This Occurs
    /// - A controller session subscribes to `"ZTL-weather"`
    /// - A topic is missing the facility prefix (`"-notam"`)
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    /// Field name is not one of the configurable list fields.
    #[error("Unknown config field: {0}")]
    UnknownField(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur before any store call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Too many entries in a list field.
    #[error("{field} must have at most {max} entries, got {actual}")]
    TooManyEntries {
        field: String,
        max: usize,
        actual: usize,
    },

    /// A single list entry exceeds the configured length.
    #[error("{field} entry {index} must be at most {max} characters")]
    EntryTooLong {
        field: String,
        index: usize,
        max: usize,
    },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::UnknownTopic("ZTL-weather".to_string());
        assert_eq!(err.to_string(), "Unknown topic: ZTL-weather");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "facility_id".to_string(),
        };
        assert_eq!(err.to_string(), "facility_id is required");

        let err = ValidationError::TooManyEntries {
            field: "notices".to_string(),
            max: 2,
            actual: 3,
        };
        assert_eq!(err.to_string(), "notices must have at most 2 entries, got 3");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "facility_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
