//! Provider configuration.
//!
//! Loaded from a JSON file (missing file means defaults) and optionally
//! overlaid with `USEFETCH_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::error::StoreError;

/// Environment variable overriding [`ProviderConfig::base_url`].
pub const ENV_BASE_URL: &str = "USEFETCH_BASE_URL";
/// Environment variable overriding [`ProviderConfig::authorization_token`].
pub const ENV_AUTH_TOKEN: &str = "USEFETCH_AUTH_TOKEN";
/// Environment variable overriding [`ProviderConfig::timeout_secs`].
pub const ENV_TIMEOUT_SECS: &str = "USEFETCH_TIMEOUT_SECS";

// ============================================================================
// Log Level
// ============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Informational messages.
    #[default]
    Info,
    /// Debug output, including every request.
    Debug,
    /// Everything.
    Trace,
}

impl LogLevel {
    /// Returns the filter directive for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

// ============================================================================
// Provider Config
// ============================================================================

/// Configuration for a [`FetchProvider`](crate::context::FetchProvider).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API host, e.g. `https://api.example.com`, without a trailing slash.
    pub base_url: String,
    /// Token sent verbatim as the `Authorization` header.
    pub authorization_token: Option<String>,
    /// Client-wide request timeout.
    pub timeout_secs: u64,
    /// User agent for outgoing requests.
    pub user_agent: String,
    /// Log verbosity, applied by `usefetch::logging::init_from`.
    pub log_level: LogLevel,
    /// Optional cache entry lifetime in milliseconds. `None` keeps entries
    /// until overwritten.
    pub cache_ttl_ms: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            authorization_token: None,
            timeout_secs: 30,
            user_agent: concat!("usefetch/", env!("CARGO_PKG_VERSION")).to_string(),
            log_level: LogLevel::default(),
            cache_ttl_ms: None,
        }
    }
}

impl ProviderConfig {
    /// Creates a configuration for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Sets the authorization token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.authorization_token = Some(token.into());
        self
    }

    /// Sets the cache entry lifetime.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_ms = Some(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("usefetch")
            .join("config.json")
    }

    /// Loads configuration from the default path.
    pub fn load_default() -> Result<Self, StoreError> {
        Self::load_from(&Self::default_path())
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: ProviderConfig = serde_json::from_str(&content)?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Saves configuration to a specific path.
    ///
    /// The file may hold a token, so on Unix it is made owner-only.
    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        set_restrictive_permissions(path)?;

        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Overlays `USEFETCH_*` environment variables.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Overlays values returned by `lookup` for the `USEFETCH_*` keys.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Some(token) = lookup(ENV_AUTH_TOKEN) {
            self.authorization_token = Some(token);
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS).and_then(|v| v.parse().ok()) {
            self.timeout_secs = timeout;
        }
        self
    }

    /// Checks that the base URL is present and absolute.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.base_url.trim().is_empty() {
            return Err(StoreError::Config("base_url must not be empty".to_string()));
        }
        let parsed = Url::parse(&self.base_url)
            .map_err(|e| StoreError::Config(format!("invalid base_url: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StoreError::Config(format!(
                "base_url must use http or https, got {}",
                parsed.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(StoreError::Config("timeout_secs must be positive".to_string()));
        }
        if self.cache_ttl_ms == Some(0) {
            return Err(StoreError::Config(
                "cache_ttl_ms must be positive; omit it to keep entries indefinitely".to_string(),
            ));
        }
        Ok(())
    }

    /// The client-wide request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The cache entry lifetime, if any.
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_ms.map(Duration::from_millis)
    }
}

/// Sets restrictive file permissions (0o600) on Unix systems.
#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

/// No-op for non-Unix systems.
#[cfg(not(unix))]
fn set_restrictive_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
