//! Test doubles for the network and the storage backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use larder_client::Network;
use larder_core::{
    AppConfig, CacheStorage, CacheStores, Error, MemoryStorage, Request, RequestKey, Response, ResponseKind,
};
use url::Url;

use crate::worker::{WorkerContext, WorkerSettings};

pub const ORIGIN: &str = "http://localhost:8080";

/// Canned responses keyed by absolute URL; unknown URLs get a 404.
pub struct StubNetwork {
    origin: Url,
    routes: Mutex<HashMap<String, Response>>,
    failing: Mutex<Vec<String>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl StubNetwork {
    pub fn new() -> Self {
        Self {
            origin: Url::parse(ORIGIN).unwrap(),
            routes: Mutex::new(HashMap::new()),
            failing: Mutex::new(Vec::new()),
            offline: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Network that serves every path of the default manifest.
    pub fn with_app_shell() -> Self {
        let network = Self::new();
        for path in AppConfig::default().precache_urls {
            let body = format!("shell:{path}");
            network.serve(&path, Response::new(network.url(&path).as_str(), 200, body));
        }
        network
    }

    pub fn url(&self, path: &str) -> Url {
        self.origin.join(path).unwrap()
    }

    pub fn request(&self, path: &str) -> Request {
        Request::get(self.url(path))
    }

    pub fn serve(&self, path: &str, response: Response) {
        self.routes.lock().unwrap().insert(self.url(path).to_string(), response);
    }

    /// Make one URL fail at the transport level.
    pub fn fail(&self, path: &str) {
        self.failing.lock().unwrap().push(self.url(path).to_string());
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn go_online(&self) {
        self.offline.store(false, Ordering::SeqCst);
    }

    /// "METHOD url" for every fetch attempted, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(format!("{} {}", request.method, url));

        if self.offline.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(&url) {
            return Err(Error::HttpError(format!("network error: {url}: connection refused")));
        }

        let canned = self.routes.lock().unwrap().get(&url).cloned();
        Ok(canned.unwrap_or_else(|| Response::new(url, 404, "not found")))
    }
}

/// Storage whose writes can be switched off.
pub struct FailingStorage {
    inner: MemoryStorage,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
}

impl FailingStorage {
    pub fn new() -> Self {
        Self { inner: MemoryStorage::new(), fail_writes: AtomicBool::new(false), fail_reads: AtomicBool::new(false) }
    }

    fn check(flag: &AtomicBool) -> Result<(), Error> {
        if flag.load(Ordering::SeqCst) {
            return Err(Error::Corrupt("quota exceeded".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStorage for FailingStorage {
    async fn open_store(&self, name: &str) -> Result<(), Error> {
        self.inner.open_store(name).await
    }

    async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.inner.store_names().await
    }

    async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        self.inner.delete_store(name).await
    }

    async fn get(&self, store: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        Self::check(&self.fail_reads)?;
        self.inner.get(store, key).await
    }

    async fn match_any(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        Self::check(&self.fail_reads)?;
        self.inner.match_any(key).await
    }

    async fn put(&self, store: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        Self::check(&self.fail_writes)?;
        self.inner.put(store, key, response).await
    }

    async fn put_all(&self, store: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        Self::check(&self.fail_writes)?;
        self.inner.put_all(store, entries).await
    }

    async fn delete(&self, store: &str, key: &RequestKey) -> Result<bool, Error> {
        Self::check(&self.fail_writes)?;
        self.inner.delete(store, key).await
    }

    async fn keys(&self, store: &str) -> Result<Vec<RequestKey>, Error> {
        self.inner.keys(store).await
    }
}

/// Context over fresh in-memory stores with the default configuration.
pub fn context(network: Arc<StubNetwork>) -> WorkerContext {
    context_with(network, Arc::new(MemoryStorage::new()), &AppConfig::default())
}

pub fn context_with(network: Arc<StubNetwork>, storage: Arc<dyn CacheStorage>, config: &AppConfig) -> WorkerContext {
    let settings = WorkerSettings::from_config(config).unwrap();
    WorkerContext::new(CacheStores::new(storage), network, settings)
}

/// A cross-origin response as the network would classify it without CORS headers.
pub fn opaque(url: &str) -> Response {
    Response::new(url, 200, "opaque").with_kind(ResponseKind::Opaque)
}

pub fn runtime(network: Arc<StubNetwork>) -> crate::runtime::Runtime {
    let stores = CacheStores::new(Arc::new(MemoryStorage::new()));
    crate::runtime::Runtime::new(AppConfig::default(), stores, network)
}

/// Parse the JSON text content of a tool result.
pub fn output_json(result: &rmcp::model::CallToolResult) -> serde_json::Value {
    let content = serde_json::to_value(&result.content[0]).unwrap();
    let text = content.get("text").and_then(|v| v.as_str()).expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
