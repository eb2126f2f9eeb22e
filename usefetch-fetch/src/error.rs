//! Fetch error types.

use serde_json::Value;
use thiserror::Error;

// ============================================================================
// Transport Error
// ============================================================================

/// Error type for transport operations.
///
/// Cancellation is modelled as [`TransportError::Cancelled`] so transports
/// can report it, but the [`Http`](crate::http::Http) adapter never returns
/// it: a cancelled call resolves to `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed before a response was received.
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Request failed with status code {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Decoded response body (JSON, or a string for non-JSON bodies).
        body: Value,
    },

    /// The request was cancelled.
    #[error("Request cancelled")]
    Cancelled,

    /// A header name or value could not be encoded.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl TransportError {
    /// Returns true if this error is a cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the response body, if the server answered.
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Returns the HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Derives the message shown to users.
    ///
    /// Prefers a `message` field in the response body, then the error's own
    /// message.
    pub fn user_message(&self) -> String {
        if let Some(message) = self.body().and_then(|body| body.get("message")) {
            match message {
                Value::String(text) if !text.is_empty() => return text.clone(),
                Value::Null | Value::String(_) => {}
                other => return other.to_string(),
            }
        }

        self.to_string()
    }
}

// ============================================================================
// Usage Error
// ============================================================================

/// Misuse of the cancellation wrapper's call interface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// More positional arguments than the transport accepts.
    #[error("Wrong number of arguments: got {given}, at most {max} are accepted")]
    TooManyArguments {
        /// Arguments supplied.
        given: usize,
        /// Maximum accepted.
        max: usize,
    },

    /// A positional argument has the wrong shape.
    #[error("Argument {position} must be {expected}")]
    InvalidArgument {
        /// Zero-based argument position.
        position: usize,
        /// What was expected there.
        expected: &'static str,
    },
}
