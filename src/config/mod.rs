//! Configuration loading for shellcache
//!
//! One TOML file drives every command. Loading is read → parse → validate;
//! a config that parses but names a live-data fallback page never reaches
//! the router.
//!
//! | Path | Default |
//! |------|---------|
//! | config file | `<config_dir>/shellcache/config.toml` |
//! | cache store | `<state_dir>/shellcache/store` |
//! | audit log | `<state_dir>/shellcache/audit.log` |

pub mod schema;

pub use schema::Config;

use crate::error::{ShellCacheError, ShellCacheResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Reads and writes the config file at one path
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for the per-user config file
    pub fn new() -> Self {
        Self::with_path(Self::default_config_path())
    }

    /// Manager for an explicit file (`--config` / `SHELLCACHE_CONFIG`)
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shellcache")
            .join("config.toml")
    }

    /// Root for persistent runtime data (store, audit log)
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shellcache")
    }

    /// Store location used when `cache.store_dir` is unset
    pub fn store_dir() -> PathBuf {
        Self::state_dir().join("store")
    }

    pub fn audit_log_path() -> PathBuf {
        Self::state_dir().join("audit.log")
    }

    /// Load the validated configuration.
    ///
    /// A missing file yields the built-in defaults (the dashboard shell
    /// and the Binance denylist).
    pub async fn load(&self) -> ShellCacheResult<Config> {
        let content = match fs::read_to_string(&self.config_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    "No config at {}, using defaults",
                    self.config_path.display()
                );
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(ShellCacheError::io(
                    format!("reading config from {}", self.config_path.display()),
                    e,
                ))
            }
        };

        Self::parse(&self.config_path, &content)
    }

    /// Parse and validate file content.
    ///
    /// Errors are reported against `path`, except a denied fallback page,
    /// which keeps its own variant so the CLI can show the specific hint.
    pub fn parse(path: &Path, content: &str) -> ShellCacheResult<Config> {
        let invalid = |reason: String| ShellCacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason,
        };

        let config: Config = toml::from_str(content).map_err(|e| invalid(e.to_string()))?;
        match config.validate() {
            Ok(()) => Ok(config),
            Err(e @ ShellCacheError::FallbackDenied(_)) => Err(e),
            Err(other) => Err(invalid(other.to_string())),
        }
    }

    /// Write `config` as pretty TOML, creating the parent directory
    pub async fn save(&self, config: &Config) -> ShellCacheResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ShellCacheError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            ShellCacheError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Wrote config to {}", self.config_path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
