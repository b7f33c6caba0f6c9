//! Filesystem-backed cache store
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/v-<hash(tag)>/version.json          CacheVersion metadata
//! <root>/v-<hash(tag)>/entries/<hash>.json   one request/response pair
//! ```
//!
//! Entries are written to a temp file and renamed into place, so racing
//! writers to the same key leave one complete entry (last rename wins).

use crate::cache::store::{CacheHandle, CacheStore};
use crate::cache::version::{short_hash, CacheVersion, VersionSummary};
use crate::error::{ShellCacheError, ShellCacheResult};
use crate::http::{RequestKey, Response};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, warn};

const MANIFEST_FILE: &str = "version.json";
const ENTRIES_DIR: &str = "entries";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Serialized form of one cached pair
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    key: RequestKey,
    status: u16,
    headers: Vec<(String, String)>,
    /// Hex-encoded body bytes
    body: String,
}

impl StoredEntry {
    fn new(key: &RequestKey, response: &Response) -> Self {
        Self {
            key: key.clone(),
            status: response.status,
            headers: response.headers.clone(),
            body: hex::encode(&response.body),
        }
    }

    fn into_response(self) -> ShellCacheResult<Response> {
        let body = hex::decode(&self.body)
            .map_err(|e| ShellCacheError::Internal(format!("corrupt entry body: {}", e)))?;
        Ok(Response {
            status: self.status,
            headers: self.headers,
            body,
        })
    }
}

/// Cache store persisted under a directory
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn version_dir(&self, version: &str) -> PathBuf {
        self.root.join(CacheVersion::dir_name_for(version))
    }

    fn entry_path(&self, version: &str, key: &RequestKey) -> PathBuf {
        self.version_dir(version)
            .join(ENTRIES_DIR)
            .join(format!("{}.json", short_hash(&key.to_string(), 16)))
    }

    async fn read_manifest(dir: &Path) -> Option<CacheVersion> {
        let content = fs::read_to_string(dir.join(MANIFEST_FILE)).await.ok()?;
        match serde_json::from_str(&content) {
            Ok(version) => Some(version),
            Err(e) => {
                warn!("Ignoring unreadable manifest in {}: {}", dir.display(), e);
                None
            }
        }
    }

    async fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
        let tmp = path.with_extension(format!(
            "tmp-{}-{}",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp, content).await?;
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(())
    }

    async fn entry_files(&self, version: &str) -> ShellCacheResult<Vec<PathBuf>> {
        let dir = self.version_dir(version).join(ENTRIES_DIR);
        if !dir.exists() {
            return Ok(vec![]);
        }

        let mut files = vec![];
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| ShellCacheError::io(format!("reading {}", dir.display()), e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ShellCacheError::io("reading cache entry", e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn open(&self, version: &str) -> ShellCacheResult<CacheHandle> {
        if version.is_empty() {
            return Err(ShellCacheError::store(version, "version tag is empty"));
        }

        let dir = self.version_dir(version);
        fs::create_dir_all(dir.join(ENTRIES_DIR))
            .await
            .map_err(|e| ShellCacheError::store(version, e.to_string()))?;

        if Self::read_manifest(&dir).await.is_none() {
            let manifest = serde_json::to_vec_pretty(&CacheVersion::new(version))?;
            Self::write_atomic(&dir.join(MANIFEST_FILE), &manifest)
                .await
                .map_err(|e| ShellCacheError::store(version, e.to_string()))?;
            debug!("Created cache version {} at {}", version, dir.display());
        }

        Ok(CacheHandle::new(version))
    }

    async fn lookup(
        &self,
        handle: &CacheHandle,
        key: &RequestKey,
    ) -> ShellCacheResult<Option<Response>> {
        let path = self.entry_path(handle.version(), key);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ShellCacheError::io(
                    format!("reading cache entry {}", path.display()),
                    e,
                ))
            }
        };

        let entry: StoredEntry = serde_json::from_str(&content)?;
        // Guard against hash collisions
        if entry.key != *key {
            return Ok(None);
        }
        entry.into_response().map(Some)
    }

    async fn insert(
        &self,
        handle: &CacheHandle,
        key: &RequestKey,
        response: &Response,
    ) -> ShellCacheResult<()> {
        let version = handle.version();
        let path = self.entry_path(version, key);
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                return Err(ShellCacheError::store(version, "version has been deleted"));
            }
        }

        let content = serde_json::to_vec(&StoredEntry::new(key, response))?;
        Self::write_atomic(&path, &content)
            .await
            .map_err(|e| ShellCacheError::store(version, e.to_string()))?;

        debug!("Cached {} in {}", key, version);
        Ok(())
    }

    async fn list_versions(&self) -> ShellCacheResult<BTreeSet<String>> {
        if !self.root.exists() {
            return Ok(BTreeSet::new());
        }

        let mut versions = BTreeSet::new();
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| ShellCacheError::io("reading cache store directory", e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ShellCacheError::io("reading cache store entry", e))?
        {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(version) = Self::read_manifest(&path).await {
                versions.insert(version.name);
            }
        }

        Ok(versions)
    }

    async fn delete(&self, version: &str) -> ShellCacheResult<bool> {
        let dir = self.version_dir(version);
        if !dir.exists() {
            return Ok(false);
        }

        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| ShellCacheError::store(version, e.to_string()))?;
        debug!("Deleted cache version {}", version);
        Ok(true)
    }

    async fn entries(&self, handle: &CacheHandle) -> ShellCacheResult<Vec<RequestKey>> {
        let mut keys = vec![];
        for path in self.entry_files(handle.version()).await? {
            let Ok(content) = fs::read_to_string(&path).await else {
                continue;
            };
            if let Ok(entry) = serde_json::from_str::<StoredEntry>(&content) {
                keys.push(entry.key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn version_info(&self, version: &str) -> ShellCacheResult<Option<VersionSummary>> {
        let Some(info) = Self::read_manifest(&self.version_dir(version)).await else {
            return Ok(None);
        };

        let files = self.entry_files(version).await?;
        let mut size_bytes = 0;
        for path in &files {
            if let Ok(meta) = fs::metadata(path).await {
                size_bytes += meta.len();
            }
        }

        Ok(Some(VersionSummary {
            version: info,
            entry_count: files.len(),
            size_bytes,
        }))
    }

    fn backend_name(&self) -> &'static str {
        "disk"
    }
}
