//! # Validation Module
//!
//! Input validation applied by `ConfigService` before any store call.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Editing surface                                              │
//! │  └── Free text split into lines (lines.rs)                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: ConfigService                                                │
//! │  ├── THIS MODULE: facility ID present, list within LineLimits          │
//! │  └── Failure → InvalidArgument, no store write, no publish             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store                                                        │
//! │  └── Unknown facility → NotFound                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation only accepts or rejects. It never trims, drops empty lines or
//! reorders entries.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::ConfigField;
use crate::{DEFAULT_MAX_LINES, DEFAULT_MAX_LINE_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Line Limits
// =============================================================================

/// Size limits for a list field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineLimits {
    /// Maximum number of entries.
    pub max_lines: usize,
    /// Maximum characters per entry.
    pub max_line_len: usize,
}

impl Default for LineLimits {
    fn default() -> Self {
        LineLimits {
            max_lines: DEFAULT_MAX_LINES,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

// =============================================================================
// Validators
// =============================================================================

/// Validates a facility ID supplied by a caller.
///
/// ## Rules
/// - Must not be empty or whitespace-only
/// - Maximum 64 characters
///
/// ## Example
/// ```rust
/// use radar_core::validation::validate_facility_id;
///
/// assert!(validate_facility_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_facility_id("").is_err());
/// assert!(validate_facility_id("   ").is_err());
/// ```
pub fn validate_facility_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "facility_id".to_string(),
        });
    }

    if id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "facility_id".to_string(),
            max: 64,
        });
    }

    Ok(())
}

/// Validates a facility identifier code (e.g. "ZTL") at provisioning time.
///
/// ## Rules
/// - Must not be empty
/// - At most 16 characters
/// - Letters, digits and hyphens only (it becomes part of a topic string)
pub fn validate_facility_identifier(code: &str) -> ValidationResult<()> {
    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "facility_identifier".to_string(),
        });
    }

    if code.len() > 16 {
        return Err(ValidationError::TooLong {
            field: "facility_identifier".to_string(),
            max: 16,
        });
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "facility_identifier".to_string(),
            reason: "must contain only letters, digits, and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a list value against the configured limits.
///
/// ## Rules
/// - At most `limits.max_lines` entries
/// - Each entry at most `limits.max_line_len` characters
/// - Empty entries are allowed
pub fn validate_lines(
    field: ConfigField,
    lines: &[String],
    limits: &LineLimits,
) -> ValidationResult<()> {
    if lines.len() > limits.max_lines {
        return Err(ValidationError::TooManyEntries {
            field: field.as_str().to_string(),
            max: limits.max_lines,
            actual: lines.len(),
        });
    }

    if let Some(index) = lines
        .iter()
        .position(|line| line.chars().count() > limits.max_line_len)
    {
        return Err(ValidationError::EntryTooLong {
            field: field.as_str().to_string(),
            index,
            max: limits.max_line_len,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_validate_facility_id() {
        assert!(validate_facility_id("abc").is_ok());
        assert!(validate_facility_id("").is_err());
        assert!(validate_facility_id(" \t").is_err());
        assert!(validate_facility_id(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_facility_identifier() {
        assert!(validate_facility_identifier("ZTL").is_ok());
        assert!(validate_facility_identifier("PCT-EAST").is_ok());
        assert!(validate_facility_identifier("").is_err());
        assert!(validate_facility_identifier("Z TL").is_err());
        assert!(validate_facility_identifier(&"Z".repeat(17)).is_err());
    }

    #[test]
    fn test_empty_entries_are_valid() {
        let limits = LineLimits::default();
        assert!(validate_lines(ConfigField::Notices, &lines(&["", "", ""]), &limits).is_ok());
        assert!(validate_lines(ConfigField::Notices, &[], &limits).is_ok());
    }

    #[test]
    fn test_too_many_entries() {
        let limits = LineLimits {
            max_lines: 2,
            max_line_len: 10,
        };
        let err = validate_lines(ConfigField::SplitAssignments, &lines(&["a", "b", "c"]), &limits)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooManyEntries {
                field: "split_assignments".to_string(),
                max: 2,
                actual: 3,
            }
        );
    }

    #[test]
    fn test_entry_too_long_reports_index() {
        let limits = LineLimits {
            max_lines: 10,
            max_line_len: 3,
        };
        let err = validate_lines(ConfigField::Notices, &lines(&["ok", "toolong"]), &limits)
            .unwrap_err();
        assert!(matches!(err, ValidationError::EntryTooLong { index: 1, .. }));
    }
}
