//! Error types for shellcache
//!
//! All modules use `ShellCacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for shellcache operations
pub type ShellCacheResult<T> = Result<T, ShellCacheError>;

/// All errors that can occur in shellcache
#[derive(Error, Debug)]
pub enum ShellCacheError {
    // Network errors
    #[error("Network request failed: {url}: {reason}")]
    Network { url: String, reason: String },

    // Cache store errors
    #[error("Cache store unavailable for version {version}: {reason}")]
    StoreUnavailable { version: String, reason: String },

    #[error("{} shell asset(s) failed to precache: {}", .failed.len(), .failed.join(", "))]
    PartialPrecache { failed: Vec<String> },

    #[error("Cache version not found: {0}")]
    VersionNotFound(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Fallback page {0} matches the live-data denylist")]
    FallbackDenied(String),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl ShellCacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a store-unavailable error for a version
    pub fn store(version: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            version: version.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from the transport rather than the cache
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Network { .. } => Some("Check connectivity; cached shell assets are still served"),
            Self::StoreUnavailable { .. } => Some("Check permissions on cache.store_dir"),
            Self::FallbackDenied(_) => {
                Some("Point shell.fallback_page at a static page outside routing.live_data_hosts")
            }
            Self::VersionNotFound(_) => Some("Run: shellcache cache list"),
            Self::ConfigInvalid { .. } => Some("Run: shellcache config show"),
            _ => None,
        }
    }
}
