//! One worker version: install, activate, and per-request dispatch.

use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::try_join_all;
use larder_core::{Error, Request, Response};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::context::WorkerContext;
use super::router::RequestKind;
use super::strategies::executor;
use crate::host::ClientHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Installing,
    /// Installed and waiting for the active version to let go.
    Installed,
    Activating,
    Activated,
    /// Failed to install, or replaced by a newer version.
    Redundant,
}

/// Result of intercepting one request.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Not intercepted; the request goes to the network untouched.
    Passthrough,
    Respond { kind: RequestKind, response: Response },
}

pub struct ServiceWorker {
    ctx: WorkerContext,
    state: watch::Sender<WorkerState>,
    skip_waiting: AtomicBool,
}

impl ServiceWorker {
    pub fn new(ctx: WorkerContext) -> Self {
        let skip_waiting = AtomicBool::new(ctx.settings.skip_waiting_on_install);
        Self { ctx, state: watch::Sender::new(WorkerState::Installing), skip_waiting }
    }

    /// A version whose precache survived a restart.
    pub fn resumed(ctx: WorkerContext) -> Self {
        let worker = Self::new(ctx);
        worker.set_state(WorkerState::Installed);
        worker
    }

    pub fn version(&self) -> &str {
        &self.ctx.settings.version
    }

    pub fn context(&self) -> &WorkerContext {
        &self.ctx
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    pub(crate) fn set_state(&self, state: WorkerState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::debug!(version = %self.version(), from = ?previous, to = ?state, "worker state");
        }
    }

    /// Ask to activate as soon as installed, without waiting.
    pub fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    pub fn wants_skip_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Whether this version's precache already holds entries.
    pub async fn is_precached(&self) -> bool {
        matches!(self.ctx.precache().keys().await, Ok(keys) if !keys.is_empty())
    }

    /// Fetch the whole manifest, then commit it to the precache store in one go.
    ///
    /// Any transport failure or non-2xx status fails the install and nothing is written.
    pub async fn install(&self) -> Result<usize, Error> {
        self.set_state(WorkerState::Installing);
        tracing::info!(version = %self.version(), urls = self.ctx.settings.manifest.len(), "precaching app shell");

        match self.precache_manifest().await {
            Ok(count) => {
                self.set_state(WorkerState::Installed);
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(version = %self.version(), error = %e, "install failed");
                self.set_state(WorkerState::Redundant);
                Err(e)
            }
        }
    }

    async fn precache_manifest(&self) -> Result<usize, Error> {
        let network = &self.ctx.network;
        let entries = try_join_all(self.ctx.settings.manifest.iter().map(|url| async move {
            let request = Request::get(url.clone());
            let response =
                network.fetch(&request).await.map_err(|e| Error::InstallFailed(format!("{url}: {e}")))?;
            if !response.is_ok() {
                return Err(Error::InstallFailed(format!("{url}: status {}", response.status)));
            }
            Ok((request.key(), response))
        }))
        .await?;

        let precache = self.ctx.stores.open(&self.ctx.settings.precache).await?;
        precache.put_all(&entries).await.map_err(|e| Error::InstallFailed(format!("{}: {e}", precache.name())))?;
        Ok(entries.len())
    }

    /// Delete every store outside the known-good set, then claim open views.
    ///
    /// Returns the names of the deleted stores. On failure the version stays installed.
    pub async fn activate(&self, host: &dyn ClientHost) -> Result<Vec<String>, Error> {
        self.set_state(WorkerState::Activating);

        match self.purge_stale_stores().await {
            Ok(deleted) => {
                let claimed = host.claim().await;
                self.set_state(WorkerState::Activated);
                tracing::info!(version = %self.version(), deleted = deleted.len(), claimed, "activated");
                Ok(deleted)
            }
            Err(e) => {
                tracing::warn!(version = %self.version(), error = %e, "activation failed");
                self.set_state(WorkerState::Installed);
                Err(e)
            }
        }
    }

    async fn purge_stale_stores(&self) -> Result<Vec<String>, Error> {
        let known_good = self.ctx.settings.known_good();
        let stale: Vec<String> =
            self.ctx.stores.names().await?.into_iter().filter(|name| !known_good.contains(&name.as_str())).collect();

        try_join_all(stale.iter().map(|name| async move {
            tracing::info!(store = %name, "removing old store");
            self.ctx.stores.delete(name).await
        }))
        .await?;

        Ok(stale)
    }

    /// Route one request and run its strategy.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, Error> {
        let Some(kind) = self.ctx.settings.routes.classify(request) else {
            return Ok(FetchOutcome::Passthrough);
        };

        tracing::debug!(url = %request.url, strategy = ?kind, "intercepted");
        let response = executor(kind).respond(&self.ctx, request).await?;
        Ok(FetchOutcome::Respond { kind, response })
    }
}

impl std::fmt::Debug for ServiceWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceWorker").field("version", &self.version()).field("state", &self.state()).finish()
    }
}
