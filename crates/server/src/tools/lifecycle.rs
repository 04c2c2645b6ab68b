//! sw_register, sw_status, sw_message, sw_release and views_sync.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::host::{ClientHost, View};
use crate::runtime::Runtime;
use crate::worker::{ServiceWorker, WorkerMessage, WorkerState};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VersionStatus {
    pub version: String,
    pub state: WorkerState,
}

impl VersionStatus {
    fn of(worker: &ServiceWorker) -> Self {
        Self { version: worker.version().to_string(), state: worker.state() }
    }
}

async fn active_version(runtime: &Runtime) -> Option<String> {
    runtime.registration.active().await.map(|w| w.version().to_string())
}

/// Parameters for the sw_register tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwRegisterParams {
    /// Version to register. Defaults to the configured cache version.
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwRegisterOutput {
    pub registered: VersionStatus,
    pub active_version: Option<String>,
}

pub async fn register_impl(runtime: &Runtime, params: SwRegisterParams) -> Result<CallToolResult, McpError> {
    let ctx = runtime.context(params.version.as_deref())?;
    let worker = runtime.registration.register(ctx).await?;

    json_result(&SwRegisterOutput { registered: VersionStatus::of(&worker), active_version: active_version(runtime).await })
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwStatusOutput {
    pub installing: Option<VersionStatus>,
    pub waiting: Option<VersionStatus>,
    pub active: Option<VersionStatus>,
    /// Stores the active version keeps on activation.
    pub known_good_stores: Vec<String>,
    pub views: Vec<View>,
}

pub async fn status_impl(runtime: &Runtime) -> Result<CallToolResult, McpError> {
    let registration = &runtime.registration;
    let active = registration.active().await;
    let known_good_stores = active
        .as_ref()
        .map(|w| w.context().settings.known_good().iter().map(|s| s.to_string()).collect())
        .unwrap_or_default();

    json_result(&SwStatusOutput {
        installing: registration.installing().await.as_deref().map(VersionStatus::of),
        waiting: registration.waiting().await.as_deref().map(VersionStatus::of),
        active: active.as_deref().map(VersionStatus::of),
        known_good_stores,
        views: runtime.views.views().await,
    })
}

/// Parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message posted by the application, e.g. {"type": "SKIP_WAITING"}.
    pub message: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageOutput {
    pub acted: bool,
    pub active_version: Option<String>,
}

pub async fn message_impl(runtime: &Runtime, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let message = serde_json::from_value::<WorkerMessage>(params.message).unwrap_or(WorkerMessage::Unrecognized);
    let acted = runtime.registration.handle_message(&message).await?;

    json_result(&SwMessageOutput { acted, active_version: active_version(runtime).await })
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwReleaseOutput {
    /// Version that took over, if one was waiting.
    pub promoted: Option<String>,
    pub active_version: Option<String>,
}

pub async fn release_impl(runtime: &Runtime) -> Result<CallToolResult, McpError> {
    let promoted = runtime.registration.release().await?.map(|w| w.version().to_string());

    json_result(&SwReleaseOutput { promoted, active_version: active_version(runtime).await })
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReportedView {
    pub id: String,
    /// Current location of the view.
    pub url: String,
}

/// Parameters for the views_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewsSyncParams {
    pub views: Vec<ReportedView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewsSyncOutput {
    pub views: Vec<View>,
}

pub async fn views_sync_impl(runtime: &Runtime, params: ViewsSyncParams) -> Result<CallToolResult, McpError> {
    // Views opened while a version is active start out controlled.
    let controlled = runtime.registration.active().await.is_some();
    let reported = params.views.into_iter().map(|v| (v.id, v.url)).collect();
    let views = runtime.views.sync_views(reported, controlled).await;

    json_result(&ViewsSyncOutput { views })
}
