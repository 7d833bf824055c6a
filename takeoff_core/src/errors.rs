//! # Error Types
//!
//! Structured error types for takeoff_core. Errors serialize to JSON so a
//! front end can show them or route on `error_code()` without string matching.
//!
//! Note what is *not* an error here: an unknown shape designation, a
//! malformed number typed into a field, and a merge conflict are all handled
//! locally (zeroed values, coerced input, resolved merge) and only logged.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::errors::{EstimateError, EstimateResult};
//!
//! fn validate_qty(qty: f64) -> EstimateResult<()> {
//!     if qty < 0.0 {
//!         return Err(EstimateError::invalid_input(
//!             "qty",
//!             qty.to_string(),
//!             "Quantity cannot be negative",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for takeoff_core operations
pub type EstimateResult<T> = Result<T, EstimateError>;

/// Structured error type for estimating operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum EstimateError {
    /// A raw value could not be applied to a line field
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// No line with this identity exists in the collection or store
    #[error("Line not found: {line_id}")]
    LineNotFound { line_id: Uuid },

    /// A store read or write failed. The caller keeps its pending state and may retry.
    #[error("Persistence failed: {operation} on line {line_id:?} - {reason}")]
    Persistence {
        operation: String,
        line_id: Option<Uuid>,
        reason: String,
    },

    /// An update was made against an older copy than the one stored
    #[error("Stale write to line {line_id}: written against revision {written}, stored is {stored}")]
    StaleRevision { line_id: Uuid, written: u64, stored: u64 },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// Another estimator holds the project lock
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// Project or settings JSON could not be read or written
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Project file written by an incompatible schema
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// A bulk import row could not be read
    #[error("Import failed at row {row}: {reason}")]
    Import { row: usize, reason: String },

    /// Invariant broken inside the engine
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl EstimateError {
    /// Rejected field value
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        EstimateError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a LineNotFound error
    pub fn line_not_found(line_id: Uuid) -> Self {
        EstimateError::LineNotFound { line_id }
    }

    /// Create a Persistence error
    pub fn persistence(operation: impl Into<String>, line_id: Option<Uuid>, reason: impl Into<String>) -> Self {
        EstimateError::Persistence {
            operation: operation.into(),
            line_id,
            reason: reason.into(),
        }
    }

    /// Update rejected because someone else wrote the line first
    pub fn stale_revision(line_id: Uuid, written: u64, stored: u64) -> Self {
        EstimateError::StaleRevision {
            line_id,
            written,
            stored,
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        EstimateError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Project file held by someone else
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        EstimateError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a SerializationError from anything displayable
    pub fn serialization(reason: impl std::fmt::Display) -> Self {
        EstimateError::SerializationError {
            reason: reason.to_string(),
        }
    }

    /// Create an Import error
    pub fn import(row: usize, reason: impl Into<String>) -> Self {
        EstimateError::Import {
            row,
            reason: reason.into(),
        }
    }

    /// True when the caller can retry with its pending state intact
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EstimateError::FileLocked { .. }
                | EstimateError::Persistence { .. }
                | EstimateError::StaleRevision { .. }
        )
    }

    /// Stable code for scripts and the CLI
    pub fn error_code(&self) -> &'static str {
        match self {
            EstimateError::InvalidInput { .. } => "INVALID_INPUT",
            EstimateError::LineNotFound { .. } => "LINE_NOT_FOUND",
            EstimateError::Persistence { .. } => "PERSISTENCE_FAILED",
            EstimateError::StaleRevision { .. } => "STALE_REVISION",
            EstimateError::FileError { .. } => "FILE_ERROR",
            EstimateError::FileLocked { .. } => "FILE_LOCKED",
            EstimateError::SerializationError { .. } => "SERIALIZATION_ERROR",
            EstimateError::VersionMismatch { .. } => "VERSION_MISMATCH",
            EstimateError::Import { .. } => "IMPORT_FAILED",
            EstimateError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = EstimateError::persistence("update", Some(Uuid::nil()), "connection reset");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"Persistence\""));
        let roundtrip: EstimateError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(EstimateError::line_not_found(Uuid::nil()).error_code(), "LINE_NOT_FOUND");
        assert_eq!(EstimateError::import(3, "bad quote").error_code(), "IMPORT_FAILED");
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(EstimateError::persistence("create", None, "timeout").is_recoverable());
        assert!(EstimateError::file_locked("a.tko", "sam", "now").is_recoverable());
        assert!(EstimateError::stale_revision(Uuid::nil(), 1, 2).is_recoverable());
        assert!(!EstimateError::serialization("eof").is_recoverable());
    }
}
