//! Scripted transport shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::{Notify, watch};
use usefetch::{AuthToken, FetchProvider, RequestState, Transport, TransportError};
use usefetch_fetch::{Response, TransportRequest};

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Respond `200` with this body.
    Ok(Value),
    /// Fail with this status and body.
    Fail(u16, Value),
}

/// Answers requests from a queue of replies and records what it was sent.
///
/// Once the queue is empty every request gets `{"n": <call number>}`.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    calls: AtomicUsize,
    requests: Mutex<Vec<TransportRequest>>,
    replies: Mutex<VecDeque<Reply>>,
    stall_first: bool,
    /// Notified when a stalled request has started.
    pub started: Notify,
    observer: Mutex<Option<watch::Receiver<RequestState<Value>>>>,
    observed: Mutex<Vec<RequestState<Value>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    /// The first request never completes.
    pub fn stalling_first() -> Self {
        Self {
            stall_first: true,
            ..Self::default()
        }
    }

    /// Snapshots `state` whenever a request is sent.
    pub fn observe(&self, state: watch::Receiver<RequestState<Value>>) {
        *self.observer.lock().unwrap() = Some(state);
    }

    pub fn observed(&self) -> Vec<RequestState<Value>> {
        self.observed.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last(&self) -> TransportRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<Response, TransportError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request);

        let snapshot = self
            .observer
            .lock()
            .unwrap()
            .as_ref()
            .map(|rx| rx.borrow().clone());
        if let Some(snapshot) = snapshot {
            self.observed.lock().unwrap().push(snapshot);
        }

        if self.stall_first && n == 1 {
            self.started.notify_one();
            std::future::pending::<()>().await;
        }

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Ok(body)) => Ok(Response::ok(body)),
            Some(Reply::Fail(status, body)) => Err(TransportError::Status { status, body }),
            None => Ok(Response::ok(json!({"n": n}))),
        }
    }
}

/// Mounts a provider over `transport`.
pub fn provider(transport: &Arc<ScriptedTransport>, token: Option<AuthToken>) -> FetchProvider {
    let mut builder = FetchProvider::builder("https://api.example.com")
        .transport(Arc::clone(transport) as Arc<dyn Transport>);
    if let Some(token) = token {
        builder = builder.auth_token(token);
    }
    builder.mount().unwrap()
}
