//! Caller-supplied transport options.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::debug;

use crate::cancel::CancelSignal;
use crate::error::UsageError;

/// Transport-level options merged into every request of a call-site.
///
/// Headers given here win over the computed `Authorization` headers.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra request headers.
    pub headers: HeaderMap,
    /// Query string parameters.
    pub query: Vec<(String, String)>,
    /// Per-request timeout, overriding the client default.
    pub timeout: Option<Duration>,
    /// Reserved for the cancellation wrapper, which overwrites it.
    pub cancel: Option<CancelSignal>,
}

impl RequestOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Adds a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds options from a JSON object of the form
    /// `{"headers": {..}, "params": {..}, "timeout": <ms>}`.
    ///
    /// `null` yields empty options. Unknown keys are ignored.
    pub fn from_json(value: &Value, position: usize) -> Result<Self, UsageError> {
        let invalid = |expected| UsageError::InvalidArgument { position, expected };

        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            _ => return Err(invalid("an options object")),
        };

        let mut options = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "headers" => {
                    let headers = value
                        .as_object()
                        .ok_or_else(|| invalid("an object of string headers"))?;
                    for (name, value) in headers {
                        let name = HeaderName::from_bytes(name.as_bytes())
                            .map_err(|_| invalid("an object of valid header names"))?;
                        let value = value
                            .as_str()
                            .and_then(|v| HeaderValue::from_str(v).ok())
                            .ok_or_else(|| invalid("an object of string headers"))?;
                        options.headers.insert(name, value);
                    }
                }
                "params" => {
                    let params = value
                        .as_object()
                        .ok_or_else(|| invalid("an object of query params"))?;
                    for (name, value) in params {
                        let value = match value {
                            Value::String(text) => text.clone(),
                            other => other.to_string(),
                        };
                        options.query.push((name.clone(), value));
                    }
                }
                "timeout" => {
                    let millis = value
                        .as_u64()
                        .ok_or_else(|| invalid("a timeout in milliseconds"))?;
                    options.timeout = Some(Duration::from_millis(millis));
                }
                other => debug!(key = other, "Ignoring unknown request option"),
            }
        }
        Ok(options)
    }
}
