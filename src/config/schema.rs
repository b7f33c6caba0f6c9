//! Configuration schema for shellcache
//!
//! Configuration is stored at `~/.config/shellcache/config.toml`

use crate::config::ConfigManager;
use crate::error::{ShellCacheError, ShellCacheResult};
use crate::router::RouterConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache store settings
    pub cache: CacheConfig,

    /// Shell assets and offline fallback
    pub shell: ShellConfig,

    /// Request routing
    pub routing: RoutingConfig,
}

impl Config {
    /// Effective store directory
    pub fn store_dir(&self) -> PathBuf {
        self.cache
            .store_dir
            .clone()
            .unwrap_or_else(ConfigManager::store_dir)
    }

    /// Check values the core relies on
    pub fn validate(&self) -> ShellCacheResult<()> {
        if !matches!(self.general.log_format.as_str(), "text" | "json") {
            return Err(ShellCacheError::User(format!(
                "general.log_format must be \"text\" or \"json\", got \"{}\"",
                self.general.log_format
            )));
        }
        if !self.shell.origin.contains("://") {
            return Err(ShellCacheError::User(format!(
                "shell.origin must be an absolute URL, got \"{}\"",
                self.shell.origin
            )));
        }
        RouterConfig::from_config(self).validate()
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Enable audit logging of lifecycle events
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            audit_log: true,
        }
    }
}

/// Cache store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Current version tag; bump on every deploy of new shell assets
    pub version: String,

    /// Store directory (default: state dir)
    pub store_dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            version: "angles-v1".to_string(),
            store_dir: None,
        }
    }
}

/// Shell assets configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Origin that relative URLs resolve against
    pub origin: String,

    /// Assets precached on install
    pub assets: Vec<String>,

    /// Page served to navigations while offline
    pub fallback_page: Option<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8000".to_string(),
            assets: vec![
                "/angles_dashboard.html".to_string(),
                "/manifest.json".to_string(),
                "https://cdn.jsdelivr.net/npm/lightweight-charts@3.8.0/dist/lightweight-charts.standalone.production.js".to_string(),
                "https://fonts.googleapis.com/css2?family=Share+Tech+Mono&family=VT323&display=swap".to_string(),
            ],
            fallback_page: Some("/angles_dashboard.html".to_string()),
        }
    }
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Host substrings that are always fetched live
    pub live_data_hosts: Vec<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            live_data_hosts: vec!["binance.com".to_string(), "fapi.binance".to_string()],
        }
    }
}
