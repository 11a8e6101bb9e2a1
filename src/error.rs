//! Error types for structured value decoding and projection.

use thiserror::Error;

/// Result type alias for decode and projection operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for structured value decoding and projection.
#[derive(Error, Debug)]
pub enum Error {
    /// Raw value does not parse per its declared type.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Requested host type is incompatible with the decoded value.
    #[error("Type mismatch: cannot project {actual} as {expected}")]
    TypeMismatch { expected: String, actual: String },

    /// Generic projection is not defined for the result format.
    #[error("Unsupported projection: {message}")]
    UnsupportedProjection { message: String },

    /// Column not found.
    #[error("Column not found: {name}")]
    ColumnNotFound { name: String },

    /// Column index out of bounds.
    #[error("Column index {index} out of bounds (columns: {count})")]
    ColumnIndexOutOfBounds { index: usize, count: usize },

    /// Malformed SQL type name or unknown metadata type.
    #[error("Invalid type name: {message}")]
    InvalidTypeName { message: String },

    /// Session parameter with an unusable value.
    #[error("Invalid session parameter {name}: {message}")]
    InvalidParameter { name: String, message: String },

    /// Malformed rowtype metadata.
    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl Error {
    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an unsupported projection error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedProjection {
            message: message.into(),
        }
    }

    /// Create an invalid type name error.
    pub fn invalid_type_name(message: impl Into<String>) -> Self {
        Self::InvalidTypeName {
            message: message.into(),
        }
    }
}
