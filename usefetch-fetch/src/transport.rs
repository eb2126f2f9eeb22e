//! The HTTP capability and its `reqwest` implementation.
//!
//! [`Transport`] is the seam between `usefetch` and the network. The
//! adapter above it only ever builds a [`TransportRequest`] and reads a
//! [`Response`]; tests substitute scripted transports here.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, header::HeaderMap};
use serde_json::Value;
use tracing::{debug, instrument};
use usefetch_core::Verb;

use crate::error::TransportError;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for usefetch.
const USER_AGENT: &str = concat!("usefetch/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Request / Response
// ============================================================================

/// A fully resolved request, ready to be sent.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Request verb.
    pub verb: Verb,
    /// Absolute URL.
    pub url: String,
    /// Final headers after merging.
    pub headers: HeaderMap,
    /// JSON body, `None` for GET.
    pub body: Option<Value>,
    /// Query string parameters.
    pub query: Vec<(String, String)>,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
}

/// A successful response.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Decoded body. JSON when possible, otherwise the body text.
    pub data: Value,
}

impl Response {
    /// Creates a `200 OK` response carrying `data`.
    pub fn ok(data: Value) -> Self {
        Self {
            status: 200,
            headers: HeaderMap::new(),
            data,
        }
    }
}

// ============================================================================
// Transport Trait
// ============================================================================

/// The opaque HTTP capability.
///
/// Implementations return `Err(TransportError::Status { .. })` for
/// non-success responses so every failure travels the same path.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Sends a request and waits for the response.
    async fn send(&self, request: TransportRequest) -> Result<Response, TransportError>;
}

// ============================================================================
// Reqwest Transport
// ============================================================================

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: Client,
}

impl ReqwestTransport {
    /// Creates a transport with the default timeout.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a transport with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        Self::with_settings(timeout, USER_AGENT)
    }

    /// Creates a transport with a custom timeout and user agent.
    pub fn with_settings(timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { inner: client })
    }

    /// Wraps an existing client.
    pub fn from_client(client: Client) -> Self {
        Self { inner: client }
    }

    /// Returns the inner reqwest client for advanced operations.
    pub fn inner(&self) -> &Client {
        &self.inner
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(verb = %request.verb, url = %request.url))]
    async fn send(&self, request: TransportRequest) -> Result<Response, TransportError> {
        debug!("Sending request");

        let mut builder = self
            .inner
            .request(method_for(request.verb), &request.url)
            .headers(request.headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;
        let data = decode_body(&bytes);
        debug!(status = %status, "Response received");

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: data,
            });
        }

        Ok(Response {
            status: status.as_u16(),
            headers,
            data,
        })
    }
}

/// Maps a verb onto the reqwest method.
fn method_for(verb: Verb) -> Method {
    match verb {
        Verb::Get => Method::GET,
        Verb::Post => Method::POST,
        Verb::Put => Method::PUT,
        Verb::Delete => Method::DELETE,
    }
}

/// Decodes a body as JSON, falling back to text. Empty bodies are `null`.
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

// ============================================================================
// Tests
// ============================================================================
