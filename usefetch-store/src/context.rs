//! Provider and shared context.
//!
//! A [`FetchProvider`] is mounted once per subtree. It owns the HTTP
//! adapter, the auth token and the response cache. Controllers receive a
//! [`FetchContext`] handle and go through it for every cache read and
//! write; each write bumps a version observable via [`FetchContext::subscribe`].

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info};
use usefetch_core::{AuthToken, RequestState};
use usefetch_fetch::{Http, ReqwestTransport, Transport};

use crate::cache::CacheEntry;
use crate::config::ProviderConfig;
use crate::error::StoreError;

// ============================================================================
// Inner State
// ============================================================================

/// State shared between a provider and its contexts.
#[derive(Debug)]
struct ProviderInner {
    http: Http,
    auth_token: Option<AuthToken>,
    cache: RwLock<HashMap<String, CacheEntry>>,
    cache_ttl: Option<Duration>,
    mounted: AtomicBool,
    notify: watch::Sender<u64>,
}

impl ProviderInner {
    fn notify_change(&self) {
        self.notify.send_modify(|version| *version += 1);
    }
}

// ============================================================================
// Provider Builder
// ============================================================================

/// Builder for a [`FetchProvider`].
#[derive(Debug)]
pub struct ProviderBuilder {
    base_url: String,
    auth_token: Option<AuthToken>,
    transport: Option<Arc<dyn Transport>>,
    cache_ttl: Option<Duration>,
    timeout: Duration,
    user_agent: String,
}

impl ProviderBuilder {
    /// Creates a builder for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let defaults = ProviderConfig::default();
        Self {
            base_url: base_url.into(),
            auth_token: None,
            transport: None,
            cache_ttl: None,
            timeout: defaults.timeout(),
            user_agent: defaults.user_agent,
        }
    }

    /// Sets the authorization token (literal or accessor).
    pub fn auth_token(mut self, token: impl Into<AuthToken>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Uses a custom transport instead of `reqwest`.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the cache entry lifetime.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Sets the request timeout of the default transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent of the default transport.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Mounts the provider.
    pub fn mount(self) -> Result<FetchProvider, StoreError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::with_settings(
                self.timeout,
                &self.user_agent,
            )?),
        };
        let (notify, _) = watch::channel(0);

        info!(base_url = %self.base_url, "Mounted fetch provider");
        Ok(FetchProvider {
            inner: Arc::new(ProviderInner {
                http: Http::new(self.base_url, transport),
                auth_token: self.auth_token,
                cache: RwLock::new(HashMap::new()),
                cache_ttl: self.cache_ttl,
                mounted: AtomicBool::new(true),
                notify,
            }),
        })
    }
}

// ============================================================================
// Fetch Provider
// ============================================================================

/// Owner of the shared context for one subtree.
///
/// Dropping the provider unmounts it: its contexts stop being ready.
#[derive(Debug)]
pub struct FetchProvider {
    inner: Arc<ProviderInner>,
}

impl FetchProvider {
    /// Creates a builder.
    pub fn builder(base_url: impl Into<String>) -> ProviderBuilder {
        ProviderBuilder::new(base_url)
    }

    /// Mounts a provider from configuration.
    pub fn mount(config: &ProviderConfig) -> Result<Self, StoreError> {
        config.validate()?;

        let mut builder = ProviderBuilder::new(config.base_url.clone())
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone());
        if let Some(token) = &config.authorization_token {
            builder = builder.auth_token(token.clone());
        }
        if let Some(ttl) = config.cache_ttl() {
            builder = builder.cache_ttl(ttl);
        }
        builder.mount()
    }

    /// Returns a context handle for controllers below this provider.
    pub fn context(&self) -> FetchContext {
        FetchContext {
            inner: Some(Arc::clone(&self.inner)),
        }
    }

    /// Unmounts the provider and drops every cache entry.
    pub async fn unmount(self) {
        self.inner.mounted.store(false, Ordering::SeqCst);
        self.inner.cache.write().await.clear();
        self.inner.notify_change();
        info!("Unmounted fetch provider");
    }
}

impl Drop for FetchProvider {
    fn drop(&mut self) {
        self.inner.mounted.store(false, Ordering::SeqCst);
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// A point-in-time view of the shared context.
#[derive(Debug, Clone)]
pub struct ContextSnapshot {
    /// The configured token accessor.
    pub auth_token: Option<AuthToken>,
    /// Cached states by request key.
    pub cache: HashMap<String, RequestState<Value>>,
    /// True while a provider is mounted.
    pub ready: bool,
}

/// Handle to the shared context of a mounted provider.
///
/// A default (detached) context has no provider and is never ready.
#[derive(Debug, Clone, Default)]
pub struct FetchContext {
    inner: Option<Arc<ProviderInner>>,
}

impl FetchContext {
    /// A context with no provider.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Returns true while a provider is mounted.
    pub fn is_ready(&self) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| inner.mounted.load(Ordering::SeqCst))
    }

    fn provider(&self) -> Result<&Arc<ProviderInner>, StoreError> {
        match &self.inner {
            Some(inner) if inner.mounted.load(Ordering::SeqCst) => Ok(inner),
            _ => Err(StoreError::ProviderNotMounted),
        }
    }

    /// Fails with [`StoreError::ProviderNotMounted`] unless ready.
    pub fn require_ready(&self) -> Result<(), StoreError> {
        self.provider().map(|_| ())
    }

    /// The provider's HTTP adapter.
    pub fn http(&self) -> Result<Http, StoreError> {
        Ok(self.provider()?.http.clone())
    }

    /// The configured token accessor.
    pub fn auth_token(&self) -> Option<AuthToken> {
        self.inner.as_ref().and_then(|inner| inner.auth_token.clone())
    }

    /// Resolves the token now. Empty tokens resolve to `None`.
    pub fn resolve_token(&self) -> Option<String> {
        self.inner
            .as_ref()
            .and_then(|inner| inner.auth_token.as_ref())
            .and_then(AuthToken::resolve)
    }

    /// Reads the whole context.
    pub async fn read(&self) -> ContextSnapshot {
        let ready = self.is_ready();
        let cache = match &self.inner {
            Some(inner) if ready => inner
                .cache
                .read()
                .await
                .iter()
                .filter(|(_, entry)| !entry.is_expired(inner.cache_ttl))
                .map(|(key, entry)| (key.clone(), entry.state.clone()))
                .collect(),
            _ => HashMap::new(),
        };

        ContextSnapshot {
            auth_token: self.auth_token(),
            cache,
            ready,
        }
    }

    /// Returns the cached state for `key`, unless missing or expired.
    pub async fn cached(&self, key: &str) -> Option<RequestState<Value>> {
        let inner = self.provider().ok()?;

        let entry = inner.cache.read().await.get(key).cloned()?;
        if entry.is_expired(inner.cache_ttl) {
            evict_if_expired(inner, key).await;
            return None;
        }
        Some(entry.state)
    }

    /// Writes one cache entry and notifies subscribers. Last write wins.
    pub async fn write(
        &self,
        key: impl Into<String>,
        state: RequestState<Value>,
    ) -> Result<(), StoreError> {
        let inner = self.provider()?;
        let key = key.into();

        inner
            .cache
            .write()
            .await
            .insert(key.clone(), CacheEntry::new(state));
        inner.notify_change();
        debug!(key = %key, "Cache entry updated");
        Ok(())
    }

    /// Removes one cache entry. Returns true if it existed.
    pub async fn invalidate(&self, key: &str) -> Result<bool, StoreError> {
        let inner = self.provider()?;
        let removed = inner.cache.write().await.remove(key).is_some();
        if removed {
            inner.notify_change();
            debug!(key, "Cache entry invalidated");
        }
        Ok(removed)
    }

    /// Removes every cache entry.
    pub async fn clear_cache(&self) -> Result<(), StoreError> {
        let inner = self.provider()?;
        inner.cache.write().await.clear();
        inner.notify_change();
        Ok(())
    }

    /// Number of cache entries, expired ones included.
    pub async fn cache_len(&self) -> usize {
        match &self.inner {
            Some(inner) => inner.cache.read().await.len(),
            None => 0,
        }
    }

    /// Subscribes to cache changes. The value is a change counter.
    pub fn subscribe(&self) -> Result<watch::Receiver<u64>, StoreError> {
        Ok(self.provider()?.notify.subscribe())
    }
}

/// Removes `key` if it is still expired. A write that landed after the
/// expiry was seen survives.
async fn evict_if_expired(inner: &ProviderInner, key: &str) -> bool {
    let mut cache = inner.cache.write().await;
    let expired = cache
        .get(key)
        .is_some_and(|entry| entry.is_expired(inner.cache_ttl));
    if expired {
        cache.remove(key);
        debug!(key, "Dropped expired cache entry");
    }
    expired
}

// ============================================================================
// Tests
// ============================================================================
