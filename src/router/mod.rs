//! Request router
//!
//! Classifies every intercepted request and applies one strategy:
//!
//! - **network-only** for live-data URLs: the store is never read or written
//! - **cache-first** for everything else: GET hit, or fetch and fill on a 200
//!   (other methods always hit the network and are never stored)
//! - **offline fallback** when a cache-first navigation cannot reach the network
//!
//! The store is injected, so every router instance can own an isolated one.

mod factory;
mod lifecycle;
pub mod policy;

pub use factory::create_router;
pub use lifecycle::{ActivateOutcome, InstallOutcome, Lifecycle};
pub use policy::{RoutingPolicy, Strategy};

use crate::cache::{CacheHandle, CacheStore, PrecacheFailure, PrecacheReport};
use crate::config::Config;
use crate::error::{ShellCacheError, ShellCacheResult};
use crate::http::{resolve_url, Request, RequestKey, Response};
use crate::network::Fetcher;
use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Static configuration the router is constructed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Current version tag
    pub version: String,
    /// Base for origin-relative URLs
    pub origin: String,
    /// Assets precached on install
    pub shell_assets: Vec<String>,
    /// Page served to failed navigations
    pub fallback_page: Option<String>,
    /// Live-data host substrings
    pub live_data_hosts: Vec<String>,
}

impl RouterConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            version: config.cache.version.clone(),
            origin: config.shell.origin.clone(),
            shell_assets: config.shell.assets.clone(),
            fallback_page: config.shell.fallback_page.clone(),
            live_data_hosts: config.routing.live_data_hosts.clone(),
        }
    }

    /// The fallback page must never be a live-data URL
    pub fn validate(&self) -> ShellCacheResult<()> {
        if self.version.trim().is_empty() {
            return Err(ShellCacheError::User("cache version tag is empty".to_string()));
        }
        let policy = RoutingPolicy::new(&self.origin, &self.live_data_hosts);
        if let Some(page) = &self.fallback_page {
            if policy.is_live_data(page) {
                return Err(ShellCacheError::FallbackDenied(page.clone()));
            }
        }
        Ok(())
    }
}

/// Routes intercepted requests against one cache store
pub struct Router {
    config: RouterConfig,
    policy: RoutingPolicy,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    pending_writes: Mutex<JoinSet<()>>,
}

impl Router {
    /// Create a router; fails if the fallback page is on a live-data host
    pub fn new(
        config: RouterConfig,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
    ) -> ShellCacheResult<Self> {
        config.validate()?;
        let policy = RoutingPolicy::new(&config.origin, &config.live_data_hosts);
        Ok(Self {
            config,
            policy,
            store,
            fetcher,
            pending_writes: Mutex::new(JoinSet::new()),
        })
    }

    /// Current version tag
    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Strategy a request would be served with
    pub fn classify(&self, request: &Request) -> Strategy {
        self.policy.classify(request)
    }

    /// Wait for background cache writes started by earlier intercepts
    pub async fn flush(&self) {
        let mut writes = {
            let mut guard = self
                .pending_writes
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *guard)
        };
        while let Some(result) = writes.join_next().await {
            if let Err(e) = result {
                warn!("Background cache write task failed: {}", e);
            }
        }
    }

    fn current_handle(&self) -> CacheHandle {
        CacheHandle::new(self.config.version.as_str())
    }

    async fn network_only(&self, request: &Request) -> ShellCacheResult<Response> {
        let request = request.resolved(&self.config.origin);
        debug!("network-only {} {}", request.method, request.url);
        self.fetcher.fetch(&request).await
    }

    async fn cache_first(&self, request: &Request) -> ShellCacheResult<Response> {
        let key = request.key(&self.config.origin);

        // Only GET touches the store; other methods go straight to the network
        if request.is_get() {
            match self.store.lookup(&self.current_handle(), &key).await {
                Ok(Some(hit)) => {
                    debug!("cache hit {}", key);
                    return Ok(hit);
                }
                Ok(None) => debug!("cache miss {}", key),
                Err(e) => warn!("Cache lookup failed for {}, using network: {}", key, e),
            }
        } else {
            debug!("uncacheable method {}", key);
        }

        let resolved = request.resolved(&self.config.origin);
        match self.fetcher.fetch(&resolved).await {
            Ok(response) => {
                if request.is_get() && response.is_cacheable() {
                    self.spawn_write(key, response.clone());
                }
                Ok(response)
            }
            Err(e) if request.mode.is_navigation() => match self.offline_fallback().await {
                Some(page) => {
                    info!("Serving offline fallback for {}: {}", key, e);
                    Ok(page)
                }
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    async fn offline_fallback(&self) -> Option<Response> {
        let page = self.config.fallback_page.as_deref()?;
        if self.policy.is_live_data(page) {
            warn!("Fallback page {} is a live-data URL, not serving it", page);
            return None;
        }

        let key = RequestKey::get(resolve_url(&self.config.origin, page));
        match self.store.lookup(&self.current_handle(), &key).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Fallback lookup failed for {}: {}", key, e);
                None
            }
        }
    }

    /// Store a copy without holding up the response; failures are only logged
    fn spawn_write(&self, key: RequestKey, response: Response) {
        let store = Arc::clone(&self.store);
        let version = self.config.version.clone();

        let mut writes = self
            .pending_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while writes.try_join_next().is_some() {}
        writes.spawn(async move {
            let result = match store.open(&version).await {
                Ok(handle) => store.put(&handle, &key, &response).await.map(|_| ()),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                warn!("Failed to cache {}: {}", key, e);
            }
        });
    }
}

#[async_trait]
impl Lifecycle for Router {
    async fn on_install(&self) -> InstallOutcome {
        let version = self.config.version.clone();
        info!("Installing cache version {}", version);

        let handle = match self.store.open(&version).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Cache store unavailable during install: {}", e);
                let reason = e.to_string();
                let failed = self
                    .config
                    .shell_assets
                    .iter()
                    .map(|url| PrecacheFailure {
                        url: url.clone(),
                        reason: reason.clone(),
                    })
                    .collect();
                return InstallOutcome {
                    version,
                    report: PrecacheReport {
                        stored: vec![],
                        failed,
                    },
                    store_error: Some(reason),
                    skip_waiting: true,
                };
            }
        };

        let report = self
            .store
            .populate(
                &handle,
                self.fetcher.as_ref(),
                &self.config.origin,
                &self.config.shell_assets,
            )
            .await;

        if report.is_complete() {
            info!("Precached {} shell asset(s)", report.stored.len());
        } else {
            warn!(
                "Precached {} of {} shell asset(s)",
                report.stored.len(),
                self.config.shell_assets.len()
            );
        }

        InstallOutcome {
            version,
            report,
            store_error: None,
            skip_waiting: true,
        }
    }

    async fn on_activate(&self) -> ActivateOutcome {
        let current = self.config.version.clone();
        let mut outcome = ActivateOutcome {
            current: current.clone(),
            deleted: vec![],
            failed: vec![],
            claim_clients: true,
        };

        let versions = match self.store.list_versions().await {
            Ok(versions) => versions,
            Err(e) => {
                warn!("Could not list cache versions during activate: {}", e);
                return outcome;
            }
        };

        let stale: Vec<String> = versions.into_iter().filter(|v| *v != current).collect();
        let deletions = stale.iter().map(|version| async move {
            (version, self.store.delete(version).await)
        });

        for (version, result) in join_all(deletions).await {
            match result {
                Ok(_) => {
                    info!("Removed stale cache version {}", version);
                    outcome.deleted.push(version.clone());
                }
                Err(e) => {
                    warn!("Failed to remove cache version {}: {}", version, e);
                    outcome.failed.push((version.clone(), e.to_string()));
                }
            }
        }

        outcome
    }

    async fn on_intercept(&self, request: &Request) -> ShellCacheResult<Response> {
        match self.classify(request) {
            Strategy::NetworkOnly => self.network_only(request).await,
            Strategy::CacheFirst => self.cache_first(request).await,
        }
    }
}
