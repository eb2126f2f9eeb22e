//! Positional call arguments.
//!
//! Every adapter verb takes the same four positional arguments:
//! `(url, token, body, options)`. GET ignores the body.
//!
//! A typed [`TransportCall`] cannot carry more than four, so the limit only
//! needs checking for dynamically built arguments, which is what
//! [`TransportCall::from_positional`] is for.

use serde_json::Value;
use usefetch_core::Verb;

use crate::error::UsageError;
use crate::options::RequestOptions;

/// Maximum number of positional arguments a transport call accepts.
pub const MAX_ARGS: usize = 4;

/// One call to the transport adapter.
#[derive(Debug, Clone, Default)]
pub struct TransportCall {
    /// Request verb.
    pub verb: Verb,
    /// Path relative to the adapter's base URL.
    pub url: String,
    /// Authorization token, sent only when present.
    pub token: Option<String>,
    /// Request body. Ignored for GET.
    pub body: Option<Value>,
    /// Caller options.
    pub options: RequestOptions,
}

impl TransportCall {
    /// Creates a call.
    pub fn new(
        verb: Verb,
        url: impl Into<String>,
        token: Option<String>,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Self {
        Self {
            verb,
            url: url.into(),
            token,
            body,
            options,
        }
    }

    /// Creates a GET call.
    pub fn get(url: impl Into<String>, token: Option<String>, options: RequestOptions) -> Self {
        Self::new(Verb::Get, url, token, None, options)
    }

    /// Builds a call from dynamically assembled positional arguments.
    ///
    /// `args` is `[url, token?, body?, options?]`; `url` must be a string,
    /// `token` a string or `null`, `options` an object or `null`. More than
    /// [`MAX_ARGS`] arguments is rejected.
    pub fn from_positional(verb: Verb, args: &[Value]) -> Result<Self, UsageError> {
        if args.len() > MAX_ARGS {
            return Err(UsageError::TooManyArguments {
                given: args.len(),
                max: MAX_ARGS,
            });
        }

        let url = args
            .first()
            .and_then(Value::as_str)
            .ok_or(UsageError::InvalidArgument {
                position: 0,
                expected: "a URL string",
            })?;

        let token = match args.get(1) {
            None | Some(Value::Null) => None,
            Some(Value::String(token)) => Some(token.clone()),
            Some(_) => {
                return Err(UsageError::InvalidArgument {
                    position: 1,
                    expected: "a token string or null",
                });
            }
        };

        let body = match args.get(2) {
            None | Some(Value::Null) => None,
            Some(body) => Some(body.clone()),
        };

        let options = match args.get(3) {
            None => RequestOptions::default(),
            Some(value) => RequestOptions::from_json(value, 3)?,
        };

        Ok(Self::new(verb, url, token, body, options))
    }
}
