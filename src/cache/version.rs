//! Cache version metadata
//!
//! A version is one generation of stored shell assets, addressed by an
//! opaque tag from configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Format bytes as human-readable size (e.g., "1.5 MB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Short content hash used for on-disk names
pub(crate) fn short_hash(input: &str, bytes: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..bytes])
}

/// One generation of cached shell assets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheVersion {
    /// Version tag (e.g. "angles-v1")
    pub name: String,
    /// When the version was first opened
    pub created_at: DateTime<Utc>,
}

impl CacheVersion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now(),
        }
    }

    /// Directory name for this version (tags may contain any characters)
    pub fn dir_name(&self) -> String {
        Self::dir_name_for(&self.name)
    }

    pub fn dir_name_for(name: &str) -> String {
        format!("v-{}", short_hash(name, 8))
    }
}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Version metadata plus its current contents, for display
#[derive(Debug, Clone, Serialize)]
pub struct VersionSummary {
    #[serde(flatten)]
    pub version: CacheVersion,
    pub entry_count: usize,
    pub size_bytes: u64,
}
