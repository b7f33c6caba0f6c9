//! Cache store abstraction
//!
//! Every backend implements the raw operations (`open`, `lookup`, `insert`,
//! `list_versions`, `delete`). The status guard on `put` and the bulk
//! `populate` are provided here once so every backend behaves the same.

use crate::cache::version::VersionSummary;
use crate::error::{ShellCacheError, ShellCacheResult};
use crate::http::{Request, RequestKey, Response};
use crate::network::Fetcher;
use async_trait::async_trait;
use futures_util::future::join_all;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Handle to an opened cache version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheHandle {
    version: String,
}

impl CacheHandle {
    pub(crate) fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    /// Version tag this handle writes into
    pub fn version(&self) -> &str {
        &self.version
    }
}

/// One shell asset that could not be precached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecacheFailure {
    pub url: String,
    pub reason: String,
}

/// Outcome of a bulk populate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecacheReport {
    /// Assets stored, in request order
    pub stored: Vec<String>,
    /// Assets that failed to fetch or store
    pub failed: Vec<PrecacheFailure>,
}

impl PrecacheReport {
    /// Whether every asset made it into the store
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Convert partial failure into an error for callers that want one
    pub fn into_result(self) -> ShellCacheResult<Vec<String>> {
        if self.failed.is_empty() {
            Ok(self.stored)
        } else {
            Err(ShellCacheError::PartialPrecache {
                failed: self.failed.into_iter().map(|f| f.url).collect(),
            })
        }
    }
}

/// Versioned request/response storage
///
/// Implementations must tolerate concurrent reads and concurrent writes;
/// concurrent writes to one key resolve last-write-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Create the version if missing and return a handle to it
    async fn open(&self, version: &str) -> ShellCacheResult<CacheHandle>;

    /// Exact match on method + URL within the handle's version.
    ///
    /// A version deleted underneath the handle reads as a miss.
    async fn lookup(
        &self,
        handle: &CacheHandle,
        key: &RequestKey,
    ) -> ShellCacheResult<Option<Response>>;

    /// Store a response unconditionally, overwriting any previous entry
    async fn insert(
        &self,
        handle: &CacheHandle,
        key: &RequestKey,
        response: &Response,
    ) -> ShellCacheResult<()>;

    /// Tags of every version currently stored
    async fn list_versions(&self) -> ShellCacheResult<BTreeSet<String>>;

    /// Delete a version and all its entries; returns whether it existed
    async fn delete(&self, version: &str) -> ShellCacheResult<bool>;

    /// Keys stored in a version
    async fn entries(&self, handle: &CacheHandle) -> ShellCacheResult<Vec<RequestKey>>;

    /// Metadata and size of a version, if it exists
    async fn version_info(&self, version: &str) -> ShellCacheResult<Option<VersionSummary>>;

    /// Human-readable backend name for display
    fn backend_name(&self) -> &'static str;

    /// Store a response if its key and status are cacheable.
    ///
    /// Non-GET keys and non-200 responses are dropped silently; returns
    /// whether it was stored.
    async fn put(
        &self,
        handle: &CacheHandle,
        key: &RequestKey,
        response: &Response,
    ) -> ShellCacheResult<bool> {
        if !key.is_get() {
            debug!("Not caching {} (method)", key);
            return Ok(false);
        }
        if !response.is_cacheable() {
            debug!("Not caching {} (status {})", key, response.status);
            return Ok(false);
        }
        self.insert(handle, key, response).await?;
        Ok(true)
    }

    /// Fetch every URL concurrently and store each cacheable response.
    ///
    /// A failed asset never aborts the others; each failure is reported
    /// in the returned `PrecacheReport`.
    async fn populate(
        &self,
        handle: &CacheHandle,
        fetcher: &dyn Fetcher,
        origin: &str,
        urls: &[String],
    ) -> PrecacheReport {
        let fetches = urls.iter().map(|url| async move {
            let request = Request::get(url.as_str()).resolved(origin);
            let outcome = match fetcher.fetch(&request).await {
                Ok(response) => match self.put(handle, &request.key(origin), &response).await {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(format!("HTTP {}", response.status)),
                    Err(e) => Err(e.to_string()),
                },
                Err(e) => Err(e.to_string()),
            };
            (url, outcome)
        });

        let mut report = PrecacheReport::default();
        for (url, outcome) in join_all(fetches).await {
            match outcome {
                Ok(()) => report.stored.push(url.clone()),
                Err(reason) => {
                    warn!("Failed to precache {}: {}", url, reason);
                    report.failed.push(PrecacheFailure {
                        url: url.clone(),
                        reason,
                    });
                }
            }
        }
        report
    }
}
