//! Request classification
//!
//! A request is live data when any denylist pattern appears anywhere in its
//! resolved URL. Classification never looks at cache state and runs before
//! any cache or network I/O.

use crate::http::{resolve_url, Request};
use serde::Serialize;
use std::fmt;

/// How an intercepted request is served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Live data: always the network, never the cache
    NetworkOnly,
    /// Cache hit if present, otherwise network with opportunistic fill
    CacheFirst,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkOnly => write!(f, "network-only"),
            Self::CacheFirst => write!(f, "cache-first"),
        }
    }
}

/// Static routing rule: a denylist of live-data URL substrings
#[derive(Debug, Clone)]
pub struct RoutingPolicy {
    origin: String,
    live_data_hosts: Vec<String>,
}

impl RoutingPolicy {
    /// Create a policy; empty patterns are ignored (they would match every URL)
    pub fn new(origin: impl Into<String>, live_data_hosts: &[String]) -> Self {
        Self {
            origin: origin.into(),
            live_data_hosts: live_data_hosts
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// Configured denylist patterns
    pub fn live_data_hosts(&self) -> &[String] {
        &self.live_data_hosts
    }

    /// Whether a URL (absolute or origin-relative) is live data
    ///
    /// Matches against the whole URL, so proxied or path-routed upstreams
    /// (`/forward/fapi.binance.com/...`) are caught too.
    pub fn is_live_data(&self, url: &str) -> bool {
        let absolute = resolve_url(&self.origin, url).to_ascii_lowercase();
        self.live_data_hosts
            .iter()
            .any(|pattern| absolute.contains(pattern.as_str()))
    }

    /// Pick the strategy for a request
    pub fn classify(&self, request: &Request) -> Strategy {
        if self.is_live_data(&request.url) {
            Strategy::NetworkOnly
        } else {
            Strategy::CacheFirst
        }
    }
}
