//! The request lifecycle controller.
//!
//! One [`RequestController`] per call-site. It moves its state through
//! `Idle -> Pending -> {Fulfilled, Rejected}`, serves cacheable GETs from the
//! shared context, writes fresh responses back, and never returns an error
//! from [`dispatch`](RequestController::dispatch): failures land in the
//! state as `Rejected` with a readable message.
//!
//! Every transition is published on a `watch` channel so observers can
//! re-render.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};
use usefetch_core::RequestState;
use usefetch_fetch::{Cancelable, Http, Response, TransportCall, TransportError};
use usefetch_store::FetchContext;

use crate::descriptor::RequestDescriptor;
use crate::error::HookError;
use crate::trigger::{DependencyTracker, should_auto_dispatch};

// ============================================================================
// Inner State
// ============================================================================

struct ControllerInner<T, P> {
    descriptor: RequestDescriptor<T>,
    context: FetchContext,
    http: Http,
    state: watch::Sender<RequestState<T>>,
    cancelable: Option<Cancelable>,
    dependencies: Mutex<DependencyTracker>,
    payload: PhantomData<fn(P)>,
}

// ============================================================================
// Request Controller
// ============================================================================

/// Lifecycle controller for one call-site.
///
/// `T` is the response data type, `P` the dispatch payload type. Both travel
/// as JSON; the shared cache stores type-erased values.
pub struct RequestController<T, P = Value> {
    inner: Arc<ControllerInner<T, P>>,
}

impl<T, P> Clone for RequestController<T, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, P> std::fmt::Debug for RequestController<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestController")
            .field("url", &self.inner.descriptor.url)
            .field("method", &self.inner.descriptor.method)
            .field("cancelable", &self.inner.cancelable.is_some())
            .field("cache", &self.inner.descriptor.cache)
            .finish_non_exhaustive()
    }
}

impl<T, P> RequestController<T, P>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    P: Serialize,
{
    /// Creates a controller below a mounted provider.
    ///
    /// Fails with [`HookError::ProviderNotMounted`] when `context` has no
    /// mounted provider.
    pub fn new(
        context: &FetchContext,
        descriptor: impl Into<RequestDescriptor<T>>,
    ) -> Result<Self, HookError> {
        let descriptor = descriptor.into();
        let http = context.http().map_err(|err| {
            if err.is_not_mounted() {
                HookError::ProviderNotMounted
            } else {
                HookError::Store(err)
            }
        })?;

        let (state, _) = watch::channel(RequestState::initial(descriptor.mock_data.clone()));
        let cancelable = descriptor.cancelable.then(Cancelable::new);

        debug!(url = %descriptor.url, verb = %descriptor.method, "Created request controller");
        Ok(Self {
            inner: Arc::new(ControllerInner {
                descriptor,
                context: context.clone(),
                http,
                state,
                cancelable,
                dependencies: Mutex::new(DependencyTracker::new()),
                payload: PhantomData,
            }),
        })
    }

    /// The descriptor this controller was built from.
    pub fn descriptor(&self) -> &RequestDescriptor<T> {
        &self.inner.descriptor
    }

    /// Current state snapshot.
    pub fn state(&self) -> RequestState<T> {
        self.inner.state.borrow().clone()
    }

    /// Subscribes to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.inner.state.subscribe()
    }

    /// Runs the mount trigger and returns true if it dispatched.
    ///
    /// The dispatch, if any, is awaited.
    pub async fn mount(&self) -> bool {
        let descriptor = &self.inner.descriptor;
        if let Some(dependencies) = &descriptor.dependencies {
            self.tracker().observe(dependencies);
        }

        let dispatch = should_auto_dispatch(
            descriptor.should_dispatch.as_ref(),
            descriptor.dependencies.is_some(),
        );
        if dispatch {
            self.dispatch(None).await;
        } else {
            debug!(url = %descriptor.url, "Waiting for manual dispatch");
        }
        dispatch
    }

    /// Feeds a new dependency list.
    ///
    /// When it differs from the last one the trigger is re-evaluated.
    /// Returns true if that dispatched.
    pub async fn set_dependencies(&self, dependencies: Vec<Value>) -> bool {
        let changed = self.tracker().observe(&dependencies);
        if !changed {
            return false;
        }

        let dispatch = should_auto_dispatch(self.inner.descriptor.should_dispatch.as_ref(), true);
        if dispatch {
            self.dispatch(None).await;
        }
        dispatch
    }

    fn tracker(&self) -> std::sync::MutexGuard<'_, DependencyTracker> {
        self.inner
            .dependencies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Issues the request.
    ///
    /// Superseded and cancelled calls leave the state as the newer call
    /// sets it and skip the post-call hook.
    #[instrument(
        skip(self, payload),
        fields(url = %self.inner.descriptor.url, verb = %self.inner.descriptor.method)
    )]
    pub async fn dispatch(&self, payload: Option<P>) {
        let descriptor = &self.inner.descriptor;

        if let Some(hook) = &descriptor.before_service_call {
            hook.run(&descriptor.url);
        }
        self.inner.state.send_modify(RequestState::begin);

        if descriptor.is_cacheable() && self.serve_from_cache().await {
            self.run_after();
            return;
        }

        let body = match payload.as_ref().map(serde_json::to_value).transpose() {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, "Failed to encode request payload");
                self.settle_rejected(err.to_string());
                return;
            }
        };

        let token = if descriptor.should_use_auth_token {
            self.inner.context.resolve_token()
        } else {
            None
        };

        let call = TransportCall::new(
            descriptor.method,
            descriptor.url.clone(),
            token,
            body,
            descriptor.options.clone(),
        );
        let result = match &self.inner.cancelable {
            Some(cancelable) => cancelable.call(&self.inner.http, call).await,
            None => self.inner.http.execute(call).await,
        };

        match result {
            Ok(Some(response)) => self.settle_response(response).await,
            Ok(None) => debug!("Ignoring result of cancelled request"),
            Err(err) => self.settle_error(&err),
        }
    }

    /// Applies `f` to the current data without touching the network.
    ///
    /// The state becomes fulfilled with the new data and, for cacheable
    /// call-sites, the cache entry is replaced by a cached state. Does
    /// nothing while there is no data.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let current = self.inner.state.borrow().data.clone();
        let Some(current) = current else {
            debug!(url = %self.inner.descriptor.url, "No data to update");
            return;
        };
        let next = f(&current);

        if self.inner.descriptor.is_cacheable() {
            match serde_json::to_value(&next) {
                Ok(value) => self.write_cache(RequestState::cached(value)).await,
                Err(err) => warn!(error = %err, "Failed to encode updated data for the cache"),
            }
        }
        self.inner.state.send_modify(|state| state.fulfill(next));
    }

    /// Tears the call-site down, cancelling an in-flight request when the
    /// controller is cancelable.
    pub fn unmount(&self) {
        if let Some(cancelable) = &self.inner.cancelable {
            cancelable.cancel();
        }
        debug!(url = %self.inner.descriptor.url, "Unmounted request controller");
    }

    /// Splits the controller into the state receiver, a dispatcher and an
    /// updater.
    pub fn into_parts(self) -> (watch::Receiver<RequestState<T>>, Dispatch<T, P>, Update<T, P>) {
        (
            self.subscribe(),
            Dispatch {
                controller: self.clone(),
            },
            Update { controller: self },
        )
    }

    // ------------------------------------------------------------------------
    // Settling
    // ------------------------------------------------------------------------

    /// Returns true if the state was served from the cache.
    async fn serve_from_cache(&self) -> bool {
        let url = &self.inner.descriptor.url;
        let Some(entry) = self.inner.context.cached(url).await else {
            return false;
        };

        match entry.decode::<T>() {
            Ok(RequestState {
                data: Some(data), ..
            }) => {
                if let Some(cancelable) = &self.inner.cancelable {
                    cancelable.cancel();
                }
                debug!(key = %url, "Serving from cache");
                self.inner.state.send_modify(|state| state.serve_cached(data));
                true
            }
            Ok(_) => false,
            Err(err) => {
                warn!(key = %url, error = %err, "Ignoring undecodable cache entry");
                false
            }
        }
    }

    async fn settle_response(&self, response: Response) {
        let data = match serde_json::from_value::<T>(response.data.clone()) {
            Ok(data) => data,
            Err(err) => {
                warn!(error = %err, "Failed to decode response data");
                self.settle_rejected(err.to_string());
                return;
            }
        };

        if self.inner.descriptor.is_cacheable() {
            self.write_cache(RequestState::fulfilled(response.data)).await;
        }
        self.inner.state.send_modify(|state| state.fulfill(data));
        debug!(status = response.status, "Request fulfilled");
        self.run_after();
    }

    fn settle_error(&self, err: &TransportError) {
        debug!(error = %err, "Request rejected");
        self.settle_rejected(err.user_message());
    }

    fn settle_rejected(&self, message: String) {
        self.inner.state.send_modify(|state| state.reject(message));
        self.run_after();
    }

    async fn write_cache(&self, state: RequestState<Value>) {
        let key = self.inner.descriptor.url.clone();
        if let Err(err) = self.inner.context.write(key, state).await {
            warn!(error = %err, "Failed to write cache entry");
        }
    }

    fn run_after(&self) {
        if let Some(after) = &self.inner.descriptor.after {
            let state = self.state();
            after(&state);
        }
    }
}

// ============================================================================
// Parts
// ============================================================================

/// The dispatch half of a split controller.
pub struct Dispatch<T, P = Value> {
    controller: RequestController<T, P>,
}

impl<T, P> Dispatch<T, P>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    P: Serialize,
{
    /// Issues the request with an optional payload.
    pub async fn call(&self, payload: Option<P>) {
        self.controller.dispatch(payload).await;
    }
}

/// The optimistic-update half of a split controller.
pub struct Update<T, P = Value> {
    controller: RequestController<T, P>,
}

impl<T, P> Update<T, P>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    P: Serialize,
{
    /// Transforms the current data locally.
    pub async fn apply<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        self.controller.update(f).await;
    }
}

impl<T, P> Clone for Dispatch<T, P> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
        }
    }
}

impl<T, P> Clone for Update<T, P> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
        }
    }
}

// ============================================================================
// Entry Point
// ============================================================================

/// Creates a controller and runs its mount trigger.
///
/// ```ignore
/// let users = use_fetch::<Vec<User>>(&ctx, RequestDescriptor::new("/users").cache(true)).await?;
/// println!("{}", users.state().status);
/// ```
pub async fn use_fetch<T>(
    context: &FetchContext,
    descriptor: impl Into<RequestDescriptor<T>>,
) -> Result<RequestController<T>, HookError>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    let controller = RequestController::new(context, descriptor)?;
    controller.mount().await;
    Ok(controller)
}
