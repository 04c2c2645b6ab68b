//! Everything one worker process holds: config, stores, network, views and the registration.

use std::sync::Arc;

use larder_client::Network;
use larder_core::{AppConfig, CacheStores, Error};

use crate::host::ViewRegistry;
use crate::worker::{Registration, ServiceWorker, WorkerContext, WorkerSettings};

pub struct Runtime {
    pub config: AppConfig,
    pub stores: CacheStores,
    pub network: Arc<dyn Network>,
    pub views: Arc<ViewRegistry>,
    pub registration: Registration,
}

impl Runtime {
    pub fn new(config: AppConfig, stores: CacheStores, network: Arc<dyn Network>) -> Self {
        let views = Arc::new(ViewRegistry::new());
        let registration = Registration::new(views.clone());
        Self { config, stores, network, views, registration }
    }

    /// Context for `version`, or for the configured version.
    pub fn context(&self, version: Option<&str>) -> Result<WorkerContext, Error> {
        let config = match version {
            Some(version) if version.is_empty() => {
                return Err(Error::InvalidInput("version must not be empty".into()));
            }
            Some(version) => self.config.with_version(version),
            None => self.config.clone(),
        };
        let settings = WorkerSettings::from_config(&config)?;
        Ok(WorkerContext::new(self.stores.clone(), Arc::clone(&self.network), settings))
    }

    /// Bring up the configured version: resume it from disk, or install it.
    ///
    /// A failed install is logged and leaves the process running without an
    /// active version, so every request passes straight through.
    pub async fn bootstrap(&self) -> Option<Arc<ServiceWorker>> {
        let result = async {
            if let Some(worker) = self.registration.resume(self.context(None)?).await? {
                return Ok(worker);
            }
            self.registration.register(self.context(None)?).await
        }
        .await;

        match result {
            Ok(worker) => {
                tracing::info!(version = %worker.version(), state = ?worker.state(), "worker ready");
                Some(worker)
            }
            Err(e) => {
                tracing::warn!(version = %self.config.cache_version, error = %e, "no active worker; passing requests through");
                None
            }
        }
    }

    /// Wait for background work of the active version.
    pub async fn shutdown(&self) {
        if let Some(active) = self.registration.active().await {
            active.context().settle().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubNetwork, runtime};
    use crate::worker::WorkerState;

    #[tokio::test]
    async fn test_bootstrap_installs_then_resumes() {
        let network = Arc::new(StubNetwork::with_app_shell());
        let rt = runtime(network.clone());

        let first = rt.bootstrap().await.unwrap();
        assert_eq!(first.state(), WorkerState::Activated);
        let fetched = network.calls().len();
        assert_eq!(fetched, 10);

        let restarted = Runtime::new(rt.config.clone(), rt.stores.clone(), network.clone());
        let resumed = restarted.bootstrap().await.unwrap();
        assert_eq!(resumed.state(), WorkerState::Activated);
        assert_eq!(network.calls().len(), fetched);
    }

    #[tokio::test]
    async fn test_bootstrap_offline_first_run() {
        let network = Arc::new(StubNetwork::with_app_shell());
        network.go_offline();
        let rt = runtime(network);

        assert!(rt.bootstrap().await.is_none());
        assert!(rt.registration.active().await.is_none());
    }

    #[test]
    fn test_context_rejects_empty_version() {
        let rt = runtime(Arc::new(StubNetwork::new()));
        assert!(matches!(rt.context(Some("")), Err(Error::InvalidInput(_))));
        assert_eq!(rt.context(Some("v9")).unwrap().settings.runtime, "simple-recipe-book-runtime-v9");
    }
}
