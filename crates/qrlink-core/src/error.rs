use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;

/// Result type for catalog and redirector operations.
pub type Result<T> = std::result::Result<T, QrError>;

/// Failures reported by a [`BlobStore`](crate::BlobStore) backend.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage serialization failed: {0}")]
    Serialization(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

/// The uniquely indexed field that caused a [`QrError::Conflict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConflictField {
    #[serde(rename = "code")]
    Code,
    #[serde(rename = "friendlySlug")]
    FriendlySlug,
}

impl Display for ConflictField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictField::Code => f.write_str("code"),
            ConflictField::FriendlySlug => f.write_str("friendlySlug"),
        }
    }
}

/// Errors surfaced by the qrlink store and resolver.
///
/// `NotFound` covers both "does not exist" and "exists but is
/// owned by someone else".
#[derive(Debug, Clone, Error)]
pub enum QrError {
    #[error("qr code not found")]
    NotFound,
    #[error("{field} already exists: {value}")]
    Conflict { field: ConflictField, value: String },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("qr code is inactive")]
    Inactive,
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl QrError {
    pub fn conflict(field: ConflictField, value: impl Into<String>) -> Self {
        Self::Conflict {
            field,
            value: value.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
