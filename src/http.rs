//! Request and response model shared by the router, the store and the fetcher
//!
//! Requests may carry origin-relative URLs (`/a.js`); everything that keys
//! into the cache resolves them against the configured origin first.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the host issued a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level page navigation
    Navigate,
    /// Subresource restricted to the page's origin
    SameOrigin,
    /// Opaque subresource (scripts, stylesheets, images)
    #[default]
    NoCors,
    /// Cross-origin subresource with CORS
    Cors,
}

impl RequestMode {
    /// Whether this request loads a page rather than a subresource
    pub fn is_navigation(&self) -> bool {
        matches!(self, Self::Navigate)
    }
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigate => write!(f, "navigate"),
            Self::SameOrigin => write!(f, "same-origin"),
            Self::NoCors => write!(f, "no-cors"),
            Self::Cors => write!(f, "cors"),
        }
    }
}

/// An outbound request intercepted from the host page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: String,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// Create a request with an explicit method
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            url: url.into(),
            mode: RequestMode::default(),
            headers: Vec::new(),
        }
    }

    /// Create a GET subresource request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Create a GET page-navigation request
    pub fn navigate(url: impl Into<String>) -> Self {
        Self::get(url).with_mode(RequestMode::Navigate)
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Only GET requests are ever read from or written to the cache
    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Lookup key for this request once resolved against `origin`
    pub fn key(&self, origin: &str) -> RequestKey {
        RequestKey::new(&self.method, resolve_url(origin, &self.url))
    }

    /// Copy of this request with its URL made absolute
    pub fn resolved(&self, origin: &str) -> Self {
        Self {
            url: resolve_url(origin, &self.url),
            ..self.clone()
        }
    }
}

/// A response from the network or the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Only plain 200 responses are eligible for caching
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Cache lookup key: method plus absolute URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: &str, url: impl Into<String>) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url: url.into(),
        }
    }

    /// Convenience for the common GET case
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Resolve `url` against `origin` unless it is already absolute.
pub fn resolve_url(origin: &str, url: &str) -> String {
    if url.contains("://") {
        return url.to_string();
    }
    let origin = origin.trim_end_matches('/');
    if url.starts_with('/') {
        format!("{}{}", origin, url)
    } else {
        format!("{}/{}", origin, url)
    }
}
