//! In-memory cache store
//!
//! Isolated per instance, so each router under test gets its own store.

use crate::cache::store::{CacheHandle, CacheStore};
use crate::cache::version::{CacheVersion, VersionSummary};
use crate::error::ShellCacheResult;
use crate::http::{RequestKey, Response};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Access counters, for asserting which paths touched the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub lookups: u64,
    pub writes: u64,
}

struct MemoryVersion {
    info: CacheVersion,
    entries: HashMap<RequestKey, Response>,
}

/// Cache store held entirely in process memory
#[derive(Default)]
pub struct MemoryStore {
    versions: RwLock<HashMap<String, MemoryVersion>>,
    lookups: AtomicU64,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of lookup and write counts
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            lookups: self.lookups.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }

    /// Every stored response in a version, for inspection
    pub async fn snapshot(&self, version: &str) -> HashMap<RequestKey, Response> {
        self.versions
            .read()
            .await
            .get(version)
            .map(|v| v.entries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn open(&self, version: &str) -> ShellCacheResult<CacheHandle> {
        let mut versions = self.versions.write().await;
        versions
            .entry(version.to_string())
            .or_insert_with(|| MemoryVersion {
                info: CacheVersion::new(version),
                entries: HashMap::new(),
            });
        Ok(CacheHandle::new(version))
    }

    async fn lookup(
        &self,
        handle: &CacheHandle,
        key: &RequestKey,
    ) -> ShellCacheResult<Option<Response>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let versions = self.versions.read().await;
        Ok(versions
            .get(handle.version())
            .and_then(|v| v.entries.get(key))
            .cloned())
    }

    async fn insert(
        &self,
        handle: &CacheHandle,
        key: &RequestKey,
        response: &Response,
    ) -> ShellCacheResult<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let mut versions = self.versions.write().await;
        let version = versions
            .entry(handle.version().to_string())
            .or_insert_with(|| MemoryVersion {
                info: CacheVersion::new(handle.version()),
                entries: HashMap::new(),
            });
        version.entries.insert(key.clone(), response.clone());
        Ok(())
    }

    async fn list_versions(&self) -> ShellCacheResult<BTreeSet<String>> {
        Ok(self.versions.read().await.keys().cloned().collect())
    }

    async fn delete(&self, version: &str) -> ShellCacheResult<bool> {
        Ok(self.versions.write().await.remove(version).is_some())
    }

    async fn entries(&self, handle: &CacheHandle) -> ShellCacheResult<Vec<RequestKey>> {
        let versions = self.versions.read().await;
        let mut keys: Vec<RequestKey> = versions
            .get(handle.version())
            .map(|v| v.entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }

    async fn version_info(&self, version: &str) -> ShellCacheResult<Option<VersionSummary>> {
        let versions = self.versions.read().await;
        Ok(versions.get(version).map(|v| VersionSummary {
            version: v.info.clone(),
            entry_count: v.entries.len(),
            size_bytes: v.entries.values().map(|r| r.body.len() as u64).sum(),
        }))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
