//! Outbound network fetch
//!
//! The router and the precache step only see the `Fetcher` trait; the
//! production implementation wraps a blocking `ureq` agent in
//! `spawn_blocking`. No proxy-level timeout is layered on top of the
//! transport's own.
//!
//! Bodies are read whole, up to [`MAX_BODY_BYTES`]; a larger response
//! fails as a network error.

use crate::error::{ShellCacheError, ShellCacheResult};
use crate::http::{Request, Response};
use async_trait::async_trait;
use tracing::debug;

/// Largest response body read into memory (64 MiB)
pub const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Abstract network interface
///
/// Errors returned from `fetch` are transport failures (DNS, refused
/// connection, reset). Non-2xx statuses are successful fetches and come
/// back as a `Response`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issue a request; `request.url` is already absolute
    async fn fetch(&self, request: &Request) -> ShellCacheResult<Response>;

    /// Human-readable transport name for display
    fn transport_name(&self) -> &'static str;
}

/// Fetcher backed by a `ureq` agent
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher that reports HTTP error statuses as responses
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }

    fn fetch_blocking(agent: &ureq::Agent, request: &Request) -> ShellCacheResult<Response> {
        let url = request.url.as_str();
        let result = match request.method.as_str() {
            "GET" => with_headers(agent.get(url), request).call(),
            "HEAD" => with_headers(agent.head(url), request).call(),
            "DELETE" => with_headers(agent.delete(url), request).call(),
            "POST" => with_headers(agent.post(url), request).send_empty(),
            "PUT" => with_headers(agent.put(url), request).send_empty(),
            "PATCH" => with_headers(agent.patch(url), request).send_empty(),
            other => {
                return Err(ShellCacheError::InvalidRequest(format!(
                    "unsupported method {}",
                    other
                )))
            }
        };

        let mut response = result.map_err(|e| ShellCacheError::network(url, e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(|e| ShellCacheError::network(url, format!("reading body: {}", e)))?;

        debug!("{} {} -> {}", request.method, url, status);
        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    request: &Request,
) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> ShellCacheResult<Response> {
        if !request.url.contains("://") {
            return Err(ShellCacheError::InvalidRequest(format!(
                "URL must be absolute: {}",
                request.url
            )));
        }

        let agent = self.agent.clone();
        let request = request.clone();
        let url = request.url.clone();
        tokio::task::spawn_blocking(move || Self::fetch_blocking(&agent, &request))
            .await
            .map_err(|e| ShellCacheError::network(url, format!("fetch task failed: {}", e)))?
    }

    fn transport_name(&self) -> &'static str {
        "ureq"
    }
}
