//! Core error types for `usefetch`.

use thiserror::Error;

/// Core error type for `usefetch` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The verb is not one of GET, POST, PUT or DELETE.
    #[error("Unsupported request method: {0}")]
    InvalidVerb(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
