//! Lifecycle interface driven by the host environment
//!
//! The host adapter calls these three methods; the core never registers
//! for events itself.

use crate::cache::PrecacheReport;
use crate::error::ShellCacheResult;
use crate::http::{Request, Response};
use async_trait::async_trait;

/// Result of the install signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Version that was populated
    pub version: String,
    /// Per-asset precache results
    pub report: PrecacheReport,
    /// Set when the version could not be opened at all
    pub store_error: Option<String>,
    /// Take over without waiting for the previous version's in-flight work
    pub skip_waiting: bool,
}

/// Result of the activate signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateOutcome {
    /// Version left in place
    pub current: String,
    /// Stale versions removed
    pub deleted: Vec<String>,
    /// Stale versions that could not be removed, with the reason
    pub failed: Vec<(String, String)>,
    /// Take control of already-open pages immediately
    pub claim_clients: bool,
}

/// Explicit replacement for platform event dispatch
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Create the current version and precache the shell.
    ///
    /// Never fails: precache and store problems are reported in the outcome.
    async fn on_install(&self) -> InstallOutcome;

    /// Delete every version except the current one.
    ///
    /// Never fails: deletion problems are reported in the outcome.
    async fn on_activate(&self) -> ActivateOutcome;

    /// Route one outbound request
    async fn on_intercept(&self, request: &Request) -> ShellCacheResult<Response>;
}
