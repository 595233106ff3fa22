//! Error types for storage operations.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// A supplied identifier is not structurally valid for this engine.
    #[error("invalid identifier: {value}")]
    InvalidId {
        /// The rejected identifier text.
        value: String,
    },

    /// A write would violate a unique index.
    #[error("duplicate key in collection {collection} for index {index}")]
    DuplicateKey {
        /// The collection written to.
        collection: String,
        /// The index whose uniqueness would be violated.
        index: String,
    },

    /// An index with the same name but a different definition exists.
    #[error("index {name} already exists with a different definition")]
    IndexConflict {
        /// Name of the conflicting index.
        name: String,
    },

    /// The engine could not serve the request right now.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A record could not be converted to or from its stored form.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// Creates an invalid identifier error.
    pub fn invalid_id(value: impl Into<String>) -> Self {
        Self::InvalidId {
            value: value.into(),
        }
    }

    /// Creates a duplicate key error.
    pub fn duplicate_key(collection: impl Into<String>, index: impl Into<String>) -> Self {
        Self::DuplicateKey {
            collection: collection.into(),
            index: index.into(),
        }
    }

    /// Returns true if this error is a unique index violation.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }

    /// Returns true if this error reports a malformed identifier.
    pub fn is_invalid_id(&self) -> bool {
        matches!(self, Self::InvalidId { .. })
    }
}
