//! Request descriptors.
//!
//! A [`RequestDescriptor`] is the per-call-site configuration: which URL to
//! hit, with which verb, and how the controller should treat the result.
//! A bare URL converts into a GET descriptor with default flags.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;
use usefetch_core::{RequestState, Verb};
use usefetch_fetch::RequestOptions;

use crate::error::HookError;

/// Callback run with the state a dispatch settled on.
pub type AfterHook<T> = Arc<dyn Fn(&RequestState<T>) + Send + Sync>;

// ============================================================================
// Dispatch Condition
// ============================================================================

/// Explicit condition for automatic dispatch.
#[derive(Clone)]
pub enum ShouldDispatch {
    /// A fixed answer.
    Flag(bool),
    /// A predicate evaluated at every trigger.
    When(Arc<dyn Fn() -> bool + Send + Sync>),
}

impl ShouldDispatch {
    /// Creates a predicate condition.
    pub fn when<F>(f: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self::When(Arc::new(f))
    }

    /// Evaluates the condition.
    pub fn evaluate(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::When(f) => f(),
        }
    }
}

impl From<bool> for ShouldDispatch {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl fmt::Debug for ShouldDispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(flag) => f.debug_tuple("Flag").field(flag).finish(),
            Self::When(_) => f.write_str("When(<fn>)"),
        }
    }
}

// ============================================================================
// Pre-call Hook
// ============================================================================

/// Procedure run before every dispatch.
#[derive(Clone)]
pub enum Hook {
    /// A callable hook.
    Call(Arc<dyn Fn() + Send + Sync>),
    /// A hook that was configured but cannot be called. Dispatch logs a
    /// warning and carries on.
    Disabled,
}

impl Hook {
    /// Creates a callable hook.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::Call(Arc::new(f))
    }

    /// Runs the hook, or warns if it is not callable.
    pub fn run(&self, url: &str) {
        match self {
            Self::Call(f) => f(),
            Self::Disabled => {
                warn!(url, "beforeServiceCall is not a function, skipping it");
            }
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call(_) => f.write_str("Call(<fn>)"),
            Self::Disabled => f.write_str("Disabled"),
        }
    }
}

// ============================================================================
// Request Descriptor
// ============================================================================

/// Configuration of one call-site.
#[derive(Clone)]
pub struct RequestDescriptor<T> {
    /// Path relative to the provider's base URL. Also the cache key.
    pub url: String,
    /// Request verb.
    pub method: Verb,
    /// Placeholder data shown before any response arrives.
    pub mock_data: Option<T>,
    /// Explicit auto-dispatch condition.
    pub should_dispatch: Option<ShouldDispatch>,
    /// Only the latest dispatch may commit its result.
    pub cancelable: bool,
    /// Serve and store GET responses through the shared cache.
    pub cache: bool,
    /// Send the provider's auth token.
    pub should_use_auth_token: bool,
    /// Trigger values; a change re-evaluates auto-dispatch.
    pub dependencies: Option<Vec<Value>>,
    /// Runs before every dispatch.
    pub before_service_call: Option<Hook>,
    /// Runs with the settled state after every dispatch that settles.
    pub after: Option<AfterHook<T>>,
    /// Transport options merged into every call.
    pub options: RequestOptions,
}

impl<T> RequestDescriptor<T> {
    /// Creates a GET descriptor with default flags.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Verb::Get,
            mock_data: None,
            should_dispatch: None,
            cancelable: false,
            cache: false,
            should_use_auth_token: true,
            dependencies: None,
            before_service_call: None,
            after: None,
            options: RequestOptions::default(),
        }
    }

    /// Sets the verb.
    pub fn method(mut self, method: Verb) -> Self {
        self.method = method;
        self
    }

    /// Sets the verb from its name, e.g. `"post"`.
    pub fn try_method(mut self, method: &str) -> Result<Self, HookError> {
        self.method = method.parse()?;
        Ok(self)
    }

    /// Seeds the initial state with placeholder data.
    pub fn mock_data(mut self, data: T) -> Self {
        self.mock_data = Some(data);
        self
    }

    /// Sets the auto-dispatch condition.
    pub fn should_dispatch(mut self, condition: impl Into<ShouldDispatch>) -> Self {
        self.should_dispatch = Some(condition.into());
        self
    }

    /// Enables or disables cancellation of superseded dispatches.
    pub fn cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    /// Enables or disables the shared cache.
    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Enables or disables the auth token.
    pub fn use_auth_token(mut self, enabled: bool) -> Self {
        self.should_use_auth_token = enabled;
        self
    }

    /// Sets the trigger values.
    pub fn dependencies(mut self, dependencies: Vec<Value>) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    /// Sets the pre-call hook.
    pub fn before_service_call(mut self, hook: Hook) -> Self {
        self.before_service_call = Some(hook);
        self
    }

    /// Sets the post-call hook.
    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestState<T>) + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(f));
        self
    }

    /// Sets the transport options.
    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns true if responses go through the shared cache.
    ///
    /// Only GET requests are ever cached.
    pub fn is_cacheable(&self) -> bool {
        self.cache && self.method.is_cacheable()
    }
}

impl<T> From<&str> for RequestDescriptor<T> {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl<T> From<String> for RequestDescriptor<T> {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

impl<T: fmt::Debug> fmt::Debug for RequestDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("mock_data", &self.mock_data)
            .field("should_dispatch", &self.should_dispatch)
            .field("cancelable", &self.cancelable)
            .field("cache", &self.cache)
            .field("should_use_auth_token", &self.should_use_auth_token)
            .field("dependencies", &self.dependencies)
            .field("before_service_call", &self.before_service_call)
            .field("after", &self.after.as_ref().map(|_| "<fn>"))
            .field("options", &self.options)
            .finish()
    }
}
