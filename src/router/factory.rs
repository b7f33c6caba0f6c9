//! Router factory for the production stack
//!
//! Wires a disk-backed store and the HTTP fetcher from configuration.

use crate::cache::DiskStore;
use crate::config::Config;
use crate::error::ShellCacheResult;
use crate::network::HttpFetcher;
use crate::router::{Router, RouterConfig};
use std::sync::Arc;
use tracing::debug;

/// Create a router backed by `DiskStore` at the configured store path
///
/// # Returns
/// * `Ok(Router)` - Ready to receive lifecycle signals
/// * `Err` - If the configured fallback page is a live-data URL
pub fn create_router(config: &Config) -> ShellCacheResult<Router> {
    let store_dir = config.store_dir();
    debug!("Using cache store at {}", store_dir.display());

    Router::new(
        RouterConfig::from_config(config),
        Arc::new(DiskStore::new(store_dir)),
        Arc::new(HttpFetcher::new()),
    )
}
