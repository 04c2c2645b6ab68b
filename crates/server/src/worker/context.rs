//! Shared state handed to every strategy.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use larder_client::{Network, resolve};
use larder_core::cache::trim;
use larder_core::{AppConfig, CacheStores, Error, NotificationDefaults, Request, RequestKey, Response, Store};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use url::Url;

use super::router::RouteTable;

/// Resolved, per-version settings.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub version: String,
    pub precache: String,
    pub runtime: String,
    pub manifest: Vec<Url>,
    pub app_shell: RequestKey,
    pub offline_page: RequestKey,
    pub placeholder: RequestKey,
    pub image_cache_max_items: usize,
    pub skip_waiting_on_install: bool,
    pub routes: RouteTable,
    pub notification: NotificationDefaults,
    pub origin: Url,
}

impl WorkerSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;
        let at = |path: &str| resolve(&origin, path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")));

        let manifest = config.precache_urls.iter().map(|path| at(path)).collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            version: config.cache_version.clone(),
            precache: config.precache_name(),
            runtime: config.runtime_name(),
            manifest,
            app_shell: RequestKey::get(&at(&config.app_shell_page)?),
            offline_page: RequestKey::get(&at(&config.offline_page)?),
            placeholder: RequestKey::get(&at(&config.placeholder_image)?),
            image_cache_max_items: config.image_cache_max_items,
            skip_waiting_on_install: config.skip_waiting_on_install,
            routes: RouteTable::from_config(config)?,
            notification: config.notification.clone(),
            origin,
        })
    }

    /// Store names that survive activation.
    pub fn known_good(&self) -> [&str; 2] {
        [self.precache.as_str(), self.runtime.as_str()]
    }
}

/// Stores, network and settings for one worker version.
///
/// Store failures are swallowed here so that no strategy ever aborts on them.
#[derive(Clone)]
pub struct WorkerContext {
    pub stores: CacheStores,
    pub network: Arc<dyn Network>,
    pub settings: Arc<WorkerSettings>,
    background: Arc<Mutex<JoinSet<()>>>,
    /// Set once a newer version is taking over; store writes stop from then on.
    retired: Arc<AtomicBool>,
}

impl WorkerContext {
    pub fn new(stores: CacheStores, network: Arc<dyn Network>, settings: WorkerSettings) -> Self {
        Self {
            stores,
            network,
            settings: Arc::new(settings),
            background: Arc::new(Mutex::new(JoinSet::new())),
            retired: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn precache(&self) -> Store {
        self.stores.handle(&self.settings.precache)
    }

    pub fn runtime(&self) -> Store {
        self.stores.handle(&self.settings.runtime)
    }

    /// Cross-store lookup; a failing read counts as a miss.
    pub async fn lookup(&self, key: &RequestKey) -> Option<Response> {
        match self.stores.match_any(key).await {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "store read failed");
                None
            }
        }
    }

    pub async fn offline_page(&self) -> Option<Response> {
        self.lookup(&self.settings.offline_page).await
    }

    pub async fn placeholder(&self) -> Option<Response> {
        self.lookup(&self.settings.placeholder).await
    }

    /// Stop writing: no new revalidations, and every later `put_quietly` is dropped.
    ///
    /// A write into a retired version's store would recreate it after the
    /// next version purged it.
    pub fn retire(&self) {
        self.retired.store(true, Ordering::SeqCst);
    }

    /// Undo [`retire`](Self::retire) when the takeover did not happen.
    pub fn reinstate(&self) {
        self.retired.store(false, Ordering::SeqCst);
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    /// Best-effort write. Returns whether the entry landed.
    pub async fn put_quietly(&self, store: &Store, key: &RequestKey, response: &Response) -> bool {
        if self.is_retired() {
            tracing::debug!(store = %store.name(), key = %key, "version retired, write dropped");
            return false;
        }
        match store.put(key, response).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(store = %store.name(), key = %key, error = %e, "store write failed");
                false
            }
        }
    }

    /// Shrink the runtime store to its ceiling.
    pub async fn trim_runtime(&self) {
        if let Err(e) = trim(&self.runtime(), self.settings.image_cache_max_items).await {
            tracing::debug!(store = %self.settings.runtime, error = %e, "trim failed");
        }
    }

    /// Refresh an image entry without holding up the caller.
    pub async fn revalidate_in_background(&self, request: Request) {
        if self.is_retired() {
            return;
        }
        let ctx = self.clone();
        let mut background = self.background.lock().await;
        while background.try_join_next().is_some() {}

        background.spawn(async move {
            let response = match ctx.network.fetch(&request).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!(url = %request.url, error = %e, "revalidation fetch failed");
                    return;
                }
            };
            if !is_cacheable_image(&response) {
                tracing::debug!(url = %request.url, status = response.status, kind = response.kind.as_str(), "revalidation skipped");
                return;
            }
            if ctx.put_quietly(&ctx.runtime(), &request.key(), &response).await {
                ctx.trim_runtime().await;
            }
        });
    }

    /// Wait for every outstanding background revalidation.
    pub async fn settle(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.background.lock().await);
            if pending.is_empty() {
                return;
            }
            while let Some(result) = pending.join_next().await {
                if let Err(e) = result {
                    tracing::debug!(error = %e, "revalidation task aborted");
                }
            }
        }
    }
}

/// Image responses are stored only when they are a visible 200.
pub fn is_cacheable_image(response: &Response) -> bool {
    response.status == 200 && !response.is_opaque()
}

impl std::fmt::Debug for WorkerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerContext").field("version", &self.settings.version).finish_non_exhaustive()
    }
}
