//! Registration: which version is installing, waiting and active.
//!
//! A new version installs alongside the active one and waits until the active
//! version lets go, unless it is the first version or was told to skip waiting.

use std::sync::Arc;

use larder_core::{Error, Request};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::context::WorkerContext;
use super::service::{FetchOutcome, ServiceWorker, WorkerState};
use crate::host::ClientHost;

/// Messages the application can post to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
    #[serde(other)]
    Unrecognized,
}

#[derive(Default)]
struct Slots {
    installing: Option<Arc<ServiceWorker>>,
    waiting: Option<Arc<ServiceWorker>>,
    active: Option<Arc<ServiceWorker>>,
}

pub struct Registration {
    host: Arc<dyn ClientHost>,
    slots: Mutex<Slots>,
}

impl Registration {
    pub fn new(host: Arc<dyn ClientHost>) -> Self {
        Self { host, slots: Mutex::new(Slots::default()) }
    }

    pub fn host(&self) -> &Arc<dyn ClientHost> {
        &self.host
    }

    pub async fn active(&self) -> Option<Arc<ServiceWorker>> {
        self.slots.lock().await.active.clone()
    }

    pub async fn waiting(&self) -> Option<Arc<ServiceWorker>> {
        self.slots.lock().await.waiting.clone()
    }

    pub async fn installing(&self) -> Option<Arc<ServiceWorker>> {
        self.slots.lock().await.installing.clone()
    }

    /// Install a version and either activate it or park it as waiting.
    ///
    /// Registering the version that is already active is a no-op. A failed
    /// install leaves the current active version in place.
    pub async fn register(&self, ctx: WorkerContext) -> Result<Arc<ServiceWorker>, Error> {
        if let Some(active) = self.active().await
            && active.version() == ctx.settings.version
        {
            tracing::debug!(version = %active.version(), "version already active");
            return Ok(active);
        }

        let worker = Arc::new(ServiceWorker::new(ctx));
        self.slots.lock().await.installing = Some(Arc::clone(&worker));

        let installed = worker.install().await;
        {
            let mut slots = self.slots.lock().await;
            if slots.installing.as_ref().is_some_and(|w| Arc::ptr_eq(w, &worker)) {
                slots.installing = None;
            }
        }
        installed?;

        let first = self.active().await.is_none();
        if first || worker.wants_skip_waiting() {
            self.promote(&worker).await?;
        } else {
            self.park(&worker).await;
        }
        Ok(worker)
    }

    /// Take over a version whose precache is still on disk, without refetching.
    ///
    /// Returns `None` when there is nothing to resume.
    pub async fn resume(&self, ctx: WorkerContext) -> Result<Option<Arc<ServiceWorker>>, Error> {
        let worker = Arc::new(ServiceWorker::resumed(ctx));
        if !worker.is_precached().await {
            return Ok(None);
        }
        tracing::info!(version = %worker.version(), "resuming precached version");
        self.promote(&worker).await?;
        Ok(Some(worker))
    }

    /// Activate the waiting version now. Returns it, if there was one.
    pub async fn skip_waiting(&self) -> Result<Option<Arc<ServiceWorker>>, Error> {
        let installing = self.installing().await;
        if let Some(worker) = &installing {
            worker.skip_waiting();
        }

        let Some(waiting) = self.waiting().await else {
            return Ok(None);
        };
        waiting.skip_waiting();
        self.promote(&waiting).await?;
        Ok(Some(waiting))
    }

    /// The active version let go of its last view; the waiting one takes over.
    pub async fn release(&self) -> Result<Option<Arc<ServiceWorker>>, Error> {
        let Some(waiting) = self.waiting().await else {
            return Ok(None);
        };
        self.promote(&waiting).await?;
        Ok(Some(waiting))
    }

    /// Returns whether the message was acted on.
    pub async fn handle_message(&self, message: &WorkerMessage) -> Result<bool, Error> {
        match message {
            WorkerMessage::SkipWaiting => {
                let had_installing = self.installing().await.is_some();
                Ok(self.skip_waiting().await?.is_some() || had_installing)
            }
            WorkerMessage::Unrecognized => Ok(false),
        }
    }

    /// Intercept a request from `view_id`, if the active version controls it.
    pub async fn handle_fetch(&self, request: &Request, view_id: Option<&str>) -> Result<FetchOutcome, Error> {
        let Some(active) = self.active().await else {
            return Ok(FetchOutcome::Passthrough);
        };
        if let Some(id) = view_id
            && !self.host.is_controlled(id).await
        {
            return Ok(FetchOutcome::Passthrough);
        }
        active.handle_fetch(request).await
    }

    async fn park(&self, worker: &Arc<ServiceWorker>) {
        let mut slots = self.slots.lock().await;
        if let Some(replaced) = slots.waiting.replace(Arc::clone(worker)) {
            replaced.set_state(WorkerState::Redundant);
        }
        tracing::info!(version = %worker.version(), "installed, waiting to activate");
    }

    /// Make `worker` the active version.
    ///
    /// The outgoing version stops writing and its background refreshes drain
    /// before the purge, so none of its stores come back afterwards.
    async fn promote(&self, worker: &Arc<ServiceWorker>) -> Result<(), Error> {
        let outgoing = self.active().await.filter(|active| !Arc::ptr_eq(active, worker));
        if let Some(outgoing) = &outgoing {
            outgoing.context().retire();
            outgoing.context().settle().await;
        }

        if let Err(e) = worker.activate(self.host.as_ref()).await {
            if let Some(outgoing) = &outgoing {
                outgoing.context().reinstate();
            }
            return Err(e);
        }

        let previous = {
            let mut slots = self.slots.lock().await;
            if slots.waiting.as_ref().is_some_and(|w| Arc::ptr_eq(w, worker)) {
                slots.waiting = None;
            }
            slots.active.replace(Arc::clone(worker))
        };

        if let Some(previous) = previous
            && !Arc::ptr_eq(&previous, worker)
        {
            previous.context().retire();
            previous.context().settle().await;
            previous.set_state(WorkerState::Redundant);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration").finish_non_exhaustive()
    }
}
