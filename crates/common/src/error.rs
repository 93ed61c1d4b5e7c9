//! Error types for Framework Hub

use thiserror::Error;

/// Result type alias using the Framework Hub error
pub type Result<T> = std::result::Result<T, Error>;

/// Framework Hub error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote API could not be reached at all.
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The remote API answered with a non-2xx status. Server detail is dropped.
    #[error("Request failed: {operation}")]
    RequestFailed { operation: String },

    #[error("Resource not found: {kind} with id {id}")]
    NotFound { kind: String, id: String },

    #[error("Resource already exists: {kind} with id {id}")]
    AlreadyExists { kind: String, id: String },

    /// A stored record matched none of the known shapes.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn request_failed(operation: impl Into<String>) -> Self {
        Self::RequestFailed {
            operation: operation.into(),
        }
    }

    /// True for failures that should send a dual-mode call to the local store.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::NetworkUnavailable(_))
    }
}
