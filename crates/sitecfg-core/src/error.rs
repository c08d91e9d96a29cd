//! Error types for the sitecfg configuration system.
//!
//! This module defines the error hierarchy used throughout the
//! sitecfg crates. All errors implement the standard
//! `std::error::Error` trait via `thiserror`.
//!
//! # Error Handling Philosophy
//!
//! - Functions that can fail return `Result<T, SitecfgError>`
//! - Validation failures carry one entry per invalid field so editing
//!   surfaces can present every problem at once
//! - Cache and transient store errors are absorbed as low as possible;
//!   only write-path failures surface to callers
//!
//! # Example
//!
//! ```
//! use sitecfg_core::{Result, SitecfgError};
//!
//! fn load_record(kind: &str) -> Result<String> {
//!     if kind.is_empty() {
//!         return Err(SitecfgError::internal("empty kind"));
//!     }
//!     Ok(format!("record for {}", kind))
//! }
//!
//! assert!(load_record("site").is_ok());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::types::SectionKind;

/// A single field-level validation problem.
///
/// Validation never collapses multiple problems into one opaque
/// message; callers receive one `FieldError` per invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field path, e.g. `primary_color` or `navigation[2].url`.
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Main error type for sitecfg operations.
///
/// Covers the full taxonomy of the configuration system: per-field
/// validation errors, recoverable cache/store failures, and the
/// non-recoverable schema class reserved for compiled-in schema
/// corruption.
#[derive(Debug, Error)]
pub enum SitecfgError {
    /// Input failed schema validation. Always recoverable; surfaced to
    /// the caller/editor with one entry per invalid field.
    #[error("validation failed with {} error(s)", errors.len())]
    ValidationFailed {
        /// Every field-level problem detected.
        errors: Vec<FieldError>,
    },

    /// A cache backend operation failed. Always recoverable: callers
    /// degrade to cache-miss behavior and the error is logged, not raised.
    #[error("cache operation '{operation}' failed: {message}")]
    Cache {
        /// Operation that failed (get/set/delete/invalidate).
        operation: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The record store failed or was unreachable.
    #[error("store operation '{operation}' failed: {message}")]
    Store {
        /// Operation that failed.
        operation: String,
        /// Description of what went wrong.
        message: String,
        /// Underlying error, if any.
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Structural corruption of a compiled-in schema. Should never occur
    /// at runtime given the fixed section schemas; health checks report
    /// this class as critical.
    #[error("schema error: {message}")]
    Schema {
        /// Description of the structural problem.
        message: String,
    },

    /// The requested configuration version does not exist.
    #[error("version {version_number} not found for {kind} record {record_id}")]
    VersionNotFound {
        /// Section kind of the requested record.
        kind: SectionKind,
        /// Record identifier.
        record_id: i64,
        /// Version number that was requested.
        version_number: u32,
    },

    /// No live record exists for the given section kind.
    #[error("no live {kind} record exists")]
    RecordNotFound {
        /// Section kind that was requested.
        kind: SectionKind,
    },

    /// An operation would violate the one-live-record-per-kind invariant.
    #[error("singleton invariant violated for {kind}: {message}")]
    SingletonViolation {
        /// Section kind involved.
        kind: SectionKind,
        /// Why the operation was rejected.
        message: String,
    },

    /// A string did not name a known section kind.
    #[error("unknown section kind '{name}'")]
    UnknownKind {
        /// The unrecognized name.
        name: String,
    },

    /// Snapshot (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SitecfgError {
    // ============================================
    // Convenience constructors
    // ============================================

    /// Creates a ValidationFailed error from collected field errors.
    pub fn validation_failed(errors: Vec<FieldError>) -> Self {
        Self::ValidationFailed { errors }
    }

    /// Creates a Cache error.
    pub fn cache_error(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Cache {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a Store error without a cause.
    pub fn store_error(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Store {
            operation: operation.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// Creates a Store error with an underlying cause.
    pub fn store_error_with_cause<E>(
        operation: impl Into<String>,
        message: impl Into<String>,
        cause: E,
    ) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store {
            operation: operation.into(),
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Creates a Schema error.
    pub fn schema_error(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Creates a VersionNotFound error.
    pub fn version_not_found(kind: SectionKind, record_id: i64, version_number: u32) -> Self {
        Self::VersionNotFound {
            kind,
            record_id,
            version_number,
        }
    }

    /// Creates a RecordNotFound error.
    pub fn record_not_found(kind: SectionKind) -> Self {
        Self::RecordNotFound { kind }
    }

    /// Creates a SingletonViolation error.
    pub fn singleton_violation(kind: SectionKind, message: impl Into<String>) -> Self {
        Self::SingletonViolation {
            kind,
            message: message.into(),
        }
    }

    /// Creates an UnknownKind error.
    pub fn unknown_kind(name: impl Into<String>) -> Self {
        Self::UnknownKind { name: name.into() }
    }

    /// Creates an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================
    // Query methods
    // ============================================

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::ValidationFailed { .. })
    }

    /// Returns true if this is a cache error.
    pub fn is_cache_error(&self) -> bool {
        matches!(self, Self::Cache { .. })
    }

    /// Returns true if this is a store/backend error.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Store { .. })
    }

    /// Returns true if this is a schema error.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Returns true if this error indicates a missing version or record.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::VersionNotFound { .. } | Self::RecordNotFound { .. }
        )
    }

    /// Returns true unless the error belongs to the non-recoverable
    /// schema class.
    pub fn is_recoverable(&self) -> bool {
        !self.is_schema_error()
    }

    /// Returns the field errors if this is a validation failure.
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            Self::ValidationFailed { errors } => Some(errors),
            _ => None,
        }
    }
}

/// Type alias for Results with SitecfgError.
///
/// Use this type for all sitecfg operations that can fail.
pub type Result<T> = std::result::Result<T, SitecfgError>;
