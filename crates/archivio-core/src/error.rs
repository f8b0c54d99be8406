//! Unified application error types for Archivio.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// Input validation failed.
    Validation,
    /// A conflict occurred (duplicate entry, concurrent modification, etc.).
    Conflict,
    /// The kind/parent combination is not permitted by the hierarchy rules.
    InvalidHierarchy,
    /// The requested move would make a node its own ancestor.
    CyclicHierarchy,
    /// A sequence would exceed the zero-padding capacity of its bucket.
    CodeExhausted,
    /// A unique-constraint violation during concurrent code allocation
    /// or placement activation.
    AllocationConflict,
    /// Inconsistent externally-supplied nesting detected during flattening.
    MalformedHierarchy,
    /// An internal server error occurred.
    Internal,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::InvalidHierarchy => write!(f, "INVALID_HIERARCHY"),
            Self::CyclicHierarchy => write!(f, "CYCLIC_HIERARCHY"),
            Self::CodeExhausted => write!(f, "CODE_EXHAUSTED"),
            Self::AllocationConflict => write!(f, "ALLOCATION_CONFLICT"),
            Self::MalformedHierarchy => write!(f, "MALFORMED_HIERARCHY"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
        }
    }
}

impl ErrorKind {
    /// Whether an operation failing with this kind may be retried
    /// transparently. Structural validation failures indicate a caller
    /// problem and must never be retried automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AllocationConflict)
    }
}

/// The unified application error used throughout Archivio.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create an invalid-hierarchy error.
    pub fn invalid_hierarchy(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidHierarchy, message)
    }

    /// Create a cyclic-hierarchy error.
    pub fn cyclic_hierarchy(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CyclicHierarchy, message)
    }

    /// Create a code-exhausted error.
    pub fn code_exhausted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CodeExhausted, message)
    }

    /// Create an allocation-conflict error.
    pub fn allocation_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AllocationConflict, message)
    }

    /// Create a malformed-hierarchy error.
    pub fn malformed_hierarchy(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedHierarchy, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Internal, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::AllocationConflict.is_retryable());
        // A deterministic collision (sequence taken under a move target)
        // is a plain conflict and must surface without retries.
        assert!(!ErrorKind::Conflict.is_retryable());
        assert!(!ErrorKind::InvalidHierarchy.is_retryable());
        assert!(!ErrorKind::CyclicHierarchy.is_retryable());
        assert!(!ErrorKind::CodeExhausted.is_retryable());
    }

    #[test]
    fn test_display_format() {
        let err = AppError::code_exhausted("bucket A is full");
        assert_eq!(err.to_string(), "CODE_EXHAUSTED: bucket A is full");
    }
}
