//! Store error types.

use thiserror::Error;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No provider is mounted above this context.
    #[error(
        "No FetchProvider is mounted: mount a provider before creating request controllers"
    )]
    ProviderNotMounted,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport construction error.
    #[error("Transport error: {0}")]
    Transport(#[from] usefetch_fetch::TransportError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true if this error means the provider is missing.
    pub fn is_not_mounted(&self) -> bool {
        matches!(self, StoreError::ProviderNotMounted)
    }
}
