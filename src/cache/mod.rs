//! Versioned cache of shell assets
//!
//! Stores request/response pairs grouped under a single version tag. The
//! router writes only into the current version; older versions are kept
//! until the next activation removes them.
//!
//! # Version Lifecycle
//!
//! | Phase | Store operation | Effect |
//! |-------|-----------------|--------|
//! | Install | `open` + `populate` | Current version created, shell assets fetched |
//! | Serve | `lookup` / `put` | Reads hit the current version, 200s are added |
//! | Redeploy | `open` (new tag) | Previous version superseded, still on disk |
//! | Activate | `list_versions` + `delete` | Every version but the current removed |

pub mod disk;
pub mod memory;
pub mod store;
pub mod version;

pub use disk::DiskStore;
pub use memory::{MemoryStore, StoreStats};
pub use store::{CacheHandle, CacheStore, PrecacheFailure, PrecacheReport};
pub use version::{format_bytes, CacheVersion, VersionSummary};
