//! Authorization token accessors.

use std::fmt;
use std::sync::Arc;

/// An authorization token: either a literal or a function evaluated on
/// every request.
///
/// The resolved value is sent verbatim as the `Authorization` header; no
/// scheme prefix is added.
#[derive(Clone)]
pub enum AuthToken {
    /// A fixed token.
    Static(String),
    /// A token computed on demand, e.g. read from a session that may rotate.
    Dynamic(Arc<dyn Fn() -> String + Send + Sync>),
}

impl AuthToken {
    /// Creates a literal token.
    pub fn new(token: impl Into<String>) -> Self {
        Self::Static(token.into())
    }

    /// Creates a token computed by `f` on every request.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Resolves the current token value.
    ///
    /// Returns `None` when the token is empty.
    pub fn resolve(&self) -> Option<String> {
        let value = match self {
            Self::Static(token) => token.clone(),
            Self::Dynamic(f) => f(),
        };
        if value.is_empty() { None } else { Some(value) }
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(_) => f.write_str("AuthToken::Static(<redacted>)"),
            Self::Dynamic(_) => f.write_str("AuthToken::Dynamic(<fn>)"),
        }
    }
}

impl From<&str> for AuthToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for AuthToken {
    fn from(token: String) -> Self {
        Self::Static(token)
    }
}
