//! Request verbs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// The HTTP verbs a call-site can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    /// Read a resource. The only verb that can be served from the cache.
    #[default]
    Get,
    /// Create a resource.
    Post,
    /// Replace a resource.
    Put,
    /// Remove a resource.
    Delete,
}

impl Verb {
    /// Returns the upper-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Returns true if requests with this verb carry a body.
    pub fn has_body(&self) -> bool {
        !matches!(self, Self::Get)
    }

    /// Returns true if responses to this verb may be cached.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Self::Get)
    }

    /// Returns all verbs.
    pub fn all() -> &'static [Verb] {
        &[Self::Get, Self::Post, Self::Put, Self::Delete]
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::all()
            .iter()
            .copied()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::InvalidVerb(s.to_string()))
    }
}
