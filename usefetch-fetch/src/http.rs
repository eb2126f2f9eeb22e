//! Transport adapter.
//!
//! [`Http`] turns a relative path, an optional token and caller options
//! into a [`TransportRequest`]:
//! - the absolute URL is `base_url + path`, with no slash normalization
//! - a token adds `Authorization: <token>` and
//!   `Access-Control-Allow-Origin: *`; caller headers override both
//! - cancellation resolves to `Ok(None)` instead of an error

use std::fmt;
use std::sync::Arc;

use reqwest::header::{
    ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION, HeaderMap, HeaderValue,
};
use serde_json::Value;
use tracing::{debug, instrument};
use usefetch_core::Verb;

use crate::call::TransportCall;
use crate::error::TransportError;
use crate::options::RequestOptions;
use crate::transport::{ReqwestTransport, Response, Transport, TransportRequest};

/// HTTP adapter bound to a base URL.
#[derive(Clone)]
pub struct Http {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl Http {
    /// Creates an adapter over the given transport.
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    /// Creates an adapter over a default [`ReqwestTransport`].
    pub fn with_reqwest(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Ok(Self::new(base_url, Arc::new(ReqwestTransport::new()?)))
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolves a relative path against the base URL.
    pub fn abs_url(&self, relative: &str) -> String {
        format!("{}{}", self.base_url, relative)
    }

    /// Performs a GET request.
    pub async fn get(
        &self,
        url: &str,
        token: Option<&str>,
        options: RequestOptions,
    ) -> Result<Option<Response>, TransportError> {
        self.fetch(Verb::Get, url, token, None, options).await
    }

    /// Performs a POST request with a JSON body.
    pub async fn post(
        &self,
        url: &str,
        token: Option<&str>,
        body: Value,
        options: RequestOptions,
    ) -> Result<Option<Response>, TransportError> {
        self.fetch(Verb::Post, url, token, Some(body), options).await
    }

    /// Performs a PUT request with a JSON body.
    pub async fn put(
        &self,
        url: &str,
        token: Option<&str>,
        body: Value,
        options: RequestOptions,
    ) -> Result<Option<Response>, TransportError> {
        self.fetch(Verb::Put, url, token, Some(body), options).await
    }

    /// Performs a DELETE request with a JSON body.
    pub async fn delete(
        &self,
        url: &str,
        token: Option<&str>,
        body: Value,
        options: RequestOptions,
    ) -> Result<Option<Response>, TransportError> {
        self.fetch(Verb::Delete, url, token, Some(body), options)
            .await
    }

    /// Dispatches a call to the verb's operation.
    ///
    /// Body-carrying verbs send `{}` when no body was supplied.
    pub async fn execute(&self, call: TransportCall) -> Result<Option<Response>, TransportError> {
        let TransportCall {
            verb,
            url,
            token,
            body,
            options,
        } = call;
        let token = token.as_deref();
        let body = body.unwrap_or_else(|| Value::Object(serde_json::Map::new()));

        match verb {
            Verb::Get => self.get(&url, token, options).await,
            Verb::Post => self.post(&url, token, body, options).await,
            Verb::Put => self.put(&url, token, body, options).await,
            Verb::Delete => self.delete(&url, token, body, options).await,
        }
    }

    /// Builds request headers: auth headers first, caller headers on top.
    fn headers(token: Option<&str>, caller: &HeaderMap) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(token)
                .map_err(|_| TransportError::InvalidHeader("Authorization".to_string()))?;
            headers.insert(AUTHORIZATION, value);
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        }
        headers.extend(caller.clone());
        Ok(headers)
    }

    #[instrument(skip(self, token, body, options), fields(verb = %verb, url = %url))]
    async fn fetch(
        &self,
        verb: Verb,
        url: &str,
        token: Option<&str>,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<Option<Response>, TransportError> {
        let RequestOptions {
            headers,
            query,
            timeout,
            cancel,
        } = options;

        if cancel.as_ref().is_some_and(|signal| signal.is_cancelled()) {
            return Ok(Self::handle_cancel());
        }

        let request = TransportRequest {
            verb,
            url: self.abs_url(url),
            headers: Self::headers(token, &headers)?,
            body: if verb.has_body() { body } else { None },
            query,
            timeout,
        };

        let outcome = match cancel {
            Some(signal) => {
                tokio::select! {
                    biased;
                    () = signal.cancelled() => Err(TransportError::Cancelled),
                    result = self.transport.send(request) => result,
                }
            }
            None => self.transport.send(request).await,
        };

        match outcome {
            Ok(response) => Ok(Some(response)),
            Err(err) if err.is_cancelled() => Ok(Self::handle_cancel()),
            Err(err) => Err(err),
        }
    }

    fn handle_cancel() -> Option<Response> {
        debug!("Request cancelled");
        None
    }
}

impl fmt::Debug for Http {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Http")
            .field("base_url", &self.base_url)
            .field("transport", &self.transport)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
