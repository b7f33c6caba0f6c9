//! Lifecycle and routing scenarios against an in-memory store

use async_trait::async_trait;
use shellcache::cache::{CacheHandle, CacheStore, MemoryStore, StoreStats, VersionSummary};
use shellcache::http::{Request, RequestKey, Response};
use shellcache::network::Fetcher;
use shellcache::router::{Lifecycle, Router, RouterConfig, Strategy};
use shellcache::{ShellCacheError, ShellCacheResult};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

const ORIGIN: &str = "http://localhost:8000";

/// Scripted network: known URLs answer, everything else is offline
#[derive(Default)]
struct ScriptedFetcher {
    routes: HashMap<String, Response>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    fn offline() -> Self {
        Self::default()
    }

    fn route(mut self, url: &str, status: u16, body: &str) -> Self {
        let url = if url.starts_with('/') {
            format!("{}{}", ORIGIN, url)
        } else {
            url.to_string()
        };
        self.routes.insert(url, Response::new(status, body));
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request) -> ShellCacheResult<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.routes
            .get(&request.url)
            .cloned()
            .ok_or_else(|| ShellCacheError::network(&request.url, "connection refused"))
    }

    fn transport_name(&self) -> &'static str {
        "scripted"
    }
}

struct Harness {
    router: Router,
    store: Arc<MemoryStore>,
    fetcher: Arc<ScriptedFetcher>,
}

fn harness(version: &str, assets: &[&str], denylist: &[&str], fetcher: ScriptedFetcher) -> Harness {
    let config = RouterConfig {
        version: version.to_string(),
        origin: ORIGIN.to_string(),
        shell_assets: assets.iter().map(|s| s.to_string()).collect(),
        fallback_page: Some("/shell.html".to_string()),
        live_data_hosts: denylist.iter().map(|s| s.to_string()).collect(),
    };
    let store = Arc::new(MemoryStore::new());
    let fetcher = Arc::new(fetcher);
    let router = Router::new(config, store.clone(), fetcher.clone()).unwrap();
    Harness {
        router,
        store,
        fetcher,
    }
}

fn key(path: &str) -> RequestKey {
    RequestKey::get(format!("{}{}", ORIGIN, path))
}

#[tokio::test]
async fn install_stores_every_asset() {
    let fetcher = ScriptedFetcher::offline()
        .route("/a.js", 200, "console.log('a')")
        .route("/b.css", 200, "body{}");
    let h = harness("v1", &["/a.js", "/b.css"], &[], fetcher);

    let outcome = h.router.on_install().await;
    assert!(outcome.report.is_complete());

    let entries = h.store.snapshot("v1").await;
    assert_eq!(entries.len(), 2);
    assert!(entries.contains_key(&key("/a.js")));
    assert!(entries.contains_key(&key("/b.css")));
}

#[tokio::test]
async fn install_with_missing_asset_completes() {
    let fetcher = ScriptedFetcher::offline()
        .route("/a.js", 200, "a")
        .route("/missing.js", 404, "not found");
    let h = harness("v1", &["/a.js", "/missing.js"], &[], fetcher);

    let outcome = h.router.on_install().await;
    assert!(outcome.skip_waiting);
    assert_eq!(outcome.report.stored, vec!["/a.js".to_string()]);
    assert_eq!(outcome.report.failed.len(), 1);
    assert_eq!(outcome.report.failed[0].url, "/missing.js");

    let entries = h.store.snapshot("v1").await;
    assert_eq!(entries.len(), 1);
    assert!(entries.contains_key(&key("/a.js")));
}

#[tokio::test]
async fn live_data_failure_leaves_store_untouched() {
    let h = harness(
        "v1",
        &[],
        &["example-exchange.com"],
        ScriptedFetcher::offline(),
    );
    let request = Request::get("https://api.example-exchange.com/price");

    let err = h.router.on_intercept(&request).await.unwrap_err();
    assert!(err.is_network());

    h.router.flush().await;
    assert_eq!(h.store.stats(), StoreStats::default());
    assert!(h.store.list_versions().await.unwrap().is_empty());
}

#[tokio::test]
async fn miss_is_returned_and_stored() {
    let fetcher = ScriptedFetcher::offline().route("/a.js", 200, "fresh");
    let h = harness("v1", &[], &[], fetcher);

    let response = h.router.on_intercept(&Request::get("/a.js")).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"fresh");

    h.router.flush().await;
    let stored = h.store.snapshot("v1").await;
    assert_eq!(stored.get(&key("/a.js")).map(|r| r.body.clone()), Some(b"fresh".to_vec()));

    // Second request is served from the store
    let again = h.router.on_intercept(&Request::get("/a.js")).await.unwrap();
    assert_eq!(again.body, b"fresh");
    assert_eq!(h.fetcher.calls(), 1);
}

#[tokio::test]
async fn classification_ignores_cache_state() {
    let fetcher = ScriptedFetcher::offline().route("/a.js", 200, "a");
    let h = harness("v1", &[], &["binance.com"], fetcher);

    let requests = [
        Request::get("/a.js"),
        Request::get("https://fapi.binance.com/fapi/v1/ticker"),
        Request::navigate("/"),
        Request::get("https://cdn.example.net/lib.js?ref=binance.com"),
    ];
    let before: Vec<Strategy> = requests.iter().map(|r| h.router.classify(r)).collect();

    h.router.on_intercept(&requests[0]).await.unwrap();
    h.router.flush().await;

    let after: Vec<Strategy> = requests.iter().map(|r| h.router.classify(r)).collect();
    assert_eq!(before, after);
    assert_eq!(
        before,
        vec![
            Strategy::CacheFirst,
            Strategy::NetworkOnly,
            Strategy::CacheFirst,
            Strategy::NetworkOnly,
        ]
    );
}

#[tokio::test]
async fn live_data_success_is_never_cached() {
    let fetcher =
        ScriptedFetcher::offline().route("https://fapi.binance.com/fapi/v1/ticker", 200, "{}");
    let h = harness("v1", &[], &["binance.com"], fetcher);
    let request = Request::get("https://fapi.binance.com/fapi/v1/ticker");

    for _ in 0..3 {
        let response = h.router.on_intercept(&request).await.unwrap();
        assert_eq!(response.status, 200);
    }

    h.router.flush().await;
    assert_eq!(h.fetcher.calls(), 3);
    assert_eq!(h.store.stats(), StoreStats::default());
}

#[tokio::test]
async fn replayed_errors_never_reach_store() {
    let fetcher = ScriptedFetcher::offline()
        .route("/gone.js", 404, "not found")
        .route("/broken.js", 500, "oops");
    let h = harness("v1", &[], &[], fetcher);

    for _ in 0..5 {
        let gone = h.router.on_intercept(&Request::get("/gone.js")).await.unwrap();
        assert_eq!(gone.status, 404);
        let broken = h.router.on_intercept(&Request::get("/broken.js")).await.unwrap();
        assert_eq!(broken.status, 500);
    }

    h.router.flush().await;
    assert!(h.store.snapshot("v1").await.is_empty());
    assert_eq!(h.store.stats().writes, 0);
}

#[tokio::test]
async fn install_twice_matches_install_once() {
    let fetcher = ScriptedFetcher::offline()
        .route("/a.js", 200, "a")
        .route("/b.css", 200, "b");
    let h = harness("v1", &["/a.js", "/b.css"], &[], fetcher);

    h.router.on_install().await;
    let once = h.store.snapshot("v1").await;
    h.router.on_install().await;
    let twice = h.store.snapshot("v1").await;

    assert_eq!(once, twice);
    assert_eq!(twice.len(), 2);
    assert_eq!(
        h.store.list_versions().await.unwrap(),
        BTreeSet::from(["v1".to_string()])
    );
}

#[tokio::test]
async fn activate_leaves_only_current_version() {
    let h = harness("v3", &[], &[], ScriptedFetcher::offline());
    for version in ["v1", "v2"] {
        let handle = h.store.open(version).await.unwrap();
        h.store
            .put(&handle, &key("/old.js"), &Response::new(200, version))
            .await
            .unwrap();
    }
    h.store.open("v3").await.unwrap();

    let outcome = h.router.on_activate().await;
    assert!(outcome.claim_clients);
    assert!(outcome.failed.is_empty());

    assert_eq!(
        h.store.list_versions().await.unwrap(),
        BTreeSet::from(["v3".to_string()])
    );
    assert!(h.store.snapshot("v1").await.is_empty());
    assert!(h.store.snapshot("v2").await.is_empty());
}

#[tokio::test]
async fn offline_navigation_gets_cached_shell() {
    let h = harness("v1", &[], &[], ScriptedFetcher::offline());
    let handle = h.store.open("v1").await.unwrap();
    h.store
        .put(&handle, &key("/shell.html"), &Response::new(200, "<html>shell</html>"))
        .await
        .unwrap();

    for url in ["/", "/dashboard?pair=BTCUSDT", "/deep/link"] {
        let response = h.router.on_intercept(&Request::navigate(url)).await.unwrap();
        assert_eq!(response.body, b"<html>shell</html>");
    }
}

#[tokio::test]
async fn installed_shell_serves_offline_after_activate() {
    let online = ScriptedFetcher::offline()
        .route("/shell.html", 200, "<html>v2</html>")
        .route("/app.js", 200, "app");
    let h = harness("v2", &["/shell.html", "/app.js"], &[], online);
    h.store.open("v1").await.unwrap();

    h.router.on_install().await;
    h.router.on_activate().await;

    // Rebuild the router over the same store with no network
    let config = h.router.config().clone();
    let offline = Router::new(config, h.store.clone(), Arc::new(ScriptedFetcher::offline())).unwrap();

    let app = offline.on_intercept(&Request::get("/app.js")).await.unwrap();
    assert_eq!(app.body, b"app");
    let page = offline
        .on_intercept(&Request::navigate("/anything"))
        .await
        .unwrap();
    assert_eq!(page.body, b"<html>v2</html>");
}

#[tokio::test]
async fn proxied_live_data_is_never_cached() {
    let url = "https://proxy.example.net/forward/fapi.binance.com/fapi/v1/ticker";
    let fetcher = ScriptedFetcher::offline().route(url, 200, "{\"price\":\"1\"}");
    let h = harness("v1", &[], &["fapi.binance"], fetcher);

    let request = Request::get(url);
    assert_eq!(h.router.classify(&request), Strategy::NetworkOnly);
    h.router.on_intercept(&request).await.unwrap();
    h.router.on_intercept(&request).await.unwrap();

    h.router.flush().await;
    assert_eq!(h.fetcher.calls(), 2);
    assert_eq!(h.store.stats(), StoreStats::default());
}

#[tokio::test]
async fn repeated_post_reaches_network_each_time() {
    let fetcher = ScriptedFetcher::offline().route("/order", 200, "filled");
    let h = harness("v1", &[], &[], fetcher);

    for _ in 0..2 {
        let response = h
            .router
            .on_intercept(&Request::new("POST", "/order"))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }

    h.router.flush().await;
    assert_eq!(h.fetcher.calls(), 2);
    assert!(h.store.snapshot("v1").await.is_empty());
}

/// Store whose operations can be switched to fail, backed by a `MemoryStore`
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_open: AtomicBool,
    fail_lookup: AtomicBool,
    fail_insert: AtomicBool,
}

impl FlakyStore {
    fn check(flag: &AtomicBool, version: &str) -> ShellCacheResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(ShellCacheError::store(version, "disk full"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheStore for FlakyStore {
    async fn open(&self, version: &str) -> ShellCacheResult<CacheHandle> {
        Self::check(&self.fail_open, version)?;
        self.inner.open(version).await
    }

    async fn lookup(
        &self,
        handle: &CacheHandle,
        key: &RequestKey,
    ) -> ShellCacheResult<Option<Response>> {
        Self::check(&self.fail_lookup, handle.version())?;
        self.inner.lookup(handle, key).await
    }

    async fn insert(
        &self,
        handle: &CacheHandle,
        key: &RequestKey,
        response: &Response,
    ) -> ShellCacheResult<()> {
        Self::check(&self.fail_insert, handle.version())?;
        self.inner.insert(handle, key, response).await
    }

    async fn list_versions(&self) -> ShellCacheResult<BTreeSet<String>> {
        self.inner.list_versions().await
    }

    async fn delete(&self, version: &str) -> ShellCacheResult<bool> {
        self.inner.delete(version).await
    }

    async fn entries(&self, handle: &CacheHandle) -> ShellCacheResult<Vec<RequestKey>> {
        self.inner.entries(handle).await
    }

    async fn version_info(&self, version: &str) -> ShellCacheResult<Option<VersionSummary>> {
        self.inner.version_info(version).await
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}

fn flaky_router(store: Arc<FlakyStore>, fetcher: ScriptedFetcher) -> (Router, Arc<ScriptedFetcher>) {
    let config = RouterConfig {
        version: "v1".to_string(),
        origin: ORIGIN.to_string(),
        shell_assets: vec!["/a.js".to_string(), "/b.css".to_string()],
        fallback_page: Some("/shell.html".to_string()),
        live_data_hosts: vec![],
    };
    let fetcher = Arc::new(fetcher);
    let router = Router::new(config, store, fetcher.clone()).unwrap();
    (router, fetcher)
}

#[tokio::test]
async fn install_with_unavailable_store_still_completes() {
    let store = Arc::new(FlakyStore::default());
    store.fail_open.store(true, Ordering::SeqCst);
    let fetcher = ScriptedFetcher::offline()
        .route("/a.js", 200, "a")
        .route("/b.css", 200, "b");
    let (router, fetcher) = flaky_router(store.clone(), fetcher);

    let outcome = router.on_install().await;
    assert!(outcome.skip_waiting);
    assert!(outcome.store_error.as_deref().unwrap().contains("disk full"));
    assert!(outcome.report.stored.is_empty());
    let failed: Vec<&str> = outcome.report.failed.iter().map(|f| f.url.as_str()).collect();
    assert_eq!(failed, vec!["/a.js", "/b.css"]);
    assert_eq!(fetcher.calls(), 0);
    assert!(store.list_versions().await.unwrap().is_empty());
}

#[tokio::test]
async fn lookup_error_falls_through_to_network() {
    let store = Arc::new(FlakyStore::default());
    let handle = store.open("v1").await.unwrap();
    store
        .put(&handle, &key("/a.js"), &Response::new(200, "stale"))
        .await
        .unwrap();
    store.fail_lookup.store(true, Ordering::SeqCst);

    let fetcher = ScriptedFetcher::offline().route("/a.js", 200, "fresh");
    let (router, fetcher) = flaky_router(store, fetcher);

    let response = router.on_intercept(&Request::get("/a.js")).await.unwrap();
    assert_eq!(response.body, b"fresh");
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn failed_background_write_does_not_reach_caller() {
    let store = Arc::new(FlakyStore::default());
    store.fail_insert.store(true, Ordering::SeqCst);

    let fetcher = ScriptedFetcher::offline().route("/a.js", 200, "fresh");
    let (router, fetcher) = flaky_router(store.clone(), fetcher);

    let response = router.on_intercept(&Request::get("/a.js")).await.unwrap();
    assert_eq!(response.body, b"fresh");
    router.flush().await;

    // Nothing was stored, so the next request goes to the network again
    assert!(store.inner.snapshot("v1").await.is_empty());
    router.on_intercept(&Request::get("/a.js")).await.unwrap();
    assert_eq!(fetcher.calls(), 2);
}
