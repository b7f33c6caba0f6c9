//! shellcache - Offline shell cache for live-data dashboards
//!
//! Precaches a versioned set of shell assets and serves them cache-first.
//! Live market data always goes to the network.

pub mod audit;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod network;
pub mod router;

pub use error::{ShellCacheError, ShellCacheResult};
