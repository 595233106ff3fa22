//! Error types for polydoc core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in polydoc core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage port error.
    #[error("storage error: {0}")]
    Storage(#[from] polydoc_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid schema or settings configuration.
    ///
    /// Raised at registration or load time, never at query time.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// A required field has no value in the locale that must be complete.
    #[error("required field {field} is missing for locale {locale}")]
    MissingRequiredField {
        /// The missing field.
        field: String,
        /// The locale that was checked.
        locale: String,
    },

    /// A stored record could not be read as the expected type.
    #[error("malformed record: {message}")]
    MalformedRecord {
        /// Description of the problem.
        message: String,
    },

    /// Version numbering kept colliding with concurrent writers.
    #[error("could not assign a version number for {document_id}/{locale} after {attempts} attempts")]
    VersionNumberConflict {
        /// The document being versioned.
        document_id: String,
        /// The locale being versioned.
        locale: String,
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a missing required field error.
    pub fn missing_required(field: impl Into<String>, locale: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
            locale: locale.into(),
        }
    }

    /// Creates a malformed record error.
    pub fn malformed_record(message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true if this error wraps a unique index violation.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_duplicate_key())
    }
}
