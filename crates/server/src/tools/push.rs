//! sw_push and sw_notification_click.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::runtime::Runtime;
use crate::worker::{ClickAction, Notification, on_notification_click, on_push};

/// Parameters for the sw_push tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Raw push payload. JSON with optional title, body and url; anything else becomes the body.
    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPushOutput {
    pub id: u64,
    pub notification: Notification,
}

pub async fn push_impl(runtime: &Runtime, params: SwPushParams) -> Result<CallToolResult, McpError> {
    let defaults = match runtime.registration.active().await {
        Some(active) => active.context().settings.notification.clone(),
        None => runtime.config.notification.clone(),
    };
    let payload = params.payload.as_deref().map(str::as_bytes);
    let (id, notification) = on_push(&*runtime.views, payload, &defaults).await;

    json_result(&SwPushOutput { id, notification })
}

/// Parameters for the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// Id returned by sw_push.
    pub id: u64,
}

pub async fn notification_click_impl(
    runtime: &Runtime, params: SwNotificationClickParams,
) -> Result<CallToolResult, McpError> {
    let origin = url::Url::parse(&runtime.config.origin)
        .map_err(|e| larder_core::Error::InvalidUrl(format!("{}: {e}", runtime.config.origin)))?;
    let action: ClickAction = on_notification_click(&*runtime.views, params.id, &origin).await?;

    json_result(&action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ClientHost;
    use crate::testing::{StubNetwork, output_json, runtime};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_push_not_json() {
        let rt = runtime(Arc::new(StubNetwork::new()));
        let out = output_json(&push_impl(&rt, SwPushParams { payload: Some("not json".into()) }).await.unwrap());

        assert_eq!(out["notification"]["title"], "Simple Recipe Book");
        assert_eq!(out["notification"]["body"], "not json");
        assert_eq!(out["notification"]["url"], "/");
        assert_eq!(out["notification"]["icon"], "/icons/icon-192.png");
    }

    #[tokio::test]
    async fn test_push_then_click_opens_then_focuses() {
        let rt = runtime(Arc::new(StubNetwork::new()));
        let payload = Some(r#"{"title":"Stew","url":"/recipes/5"}"#.to_string());

        let pushed = output_json(&push_impl(&rt, SwPushParams { payload: payload.clone() }).await.unwrap());
        let id = pushed["id"].as_u64().unwrap();
        let out = output_json(&notification_click_impl(&rt, SwNotificationClickParams { id }).await.unwrap());
        assert_eq!(out["action"], "opened");
        assert_eq!(out["view"]["url"], "http://localhost:8080/recipes/5");

        let pushed = output_json(&push_impl(&rt, SwPushParams { payload }).await.unwrap());
        let id = pushed["id"].as_u64().unwrap();
        let out = output_json(&notification_click_impl(&rt, SwNotificationClickParams { id }).await.unwrap());
        assert_eq!(out["action"], "focused");
        assert_eq!(rt.views.views().await.len(), 1);
    }

    #[tokio::test]
    async fn test_click_twice_fails() {
        let rt = runtime(Arc::new(StubNetwork::new()));
        let pushed = output_json(&push_impl(&rt, SwPushParams::default()).await.unwrap());
        let id = pushed["id"].as_u64().unwrap();

        notification_click_impl(&rt, SwNotificationClickParams { id }).await.unwrap();
        let err = notification_click_impl(&rt, SwNotificationClickParams { id }).await.unwrap_err();
        assert_eq!(err.code.0, -32015);
    }
}
