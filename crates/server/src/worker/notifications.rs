//! Push payloads to notifications, and clicks back to views.

use larder_client::resolve;
use larder_core::NotificationDefaults;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::WorkerError;
use crate::host::{ClientHost, View};

/// A notification as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub badge: Option<String>,
    /// Where a click should take the user.
    pub url: String,
}

/// Build the notification for one push payload.
///
/// JSON objects override the defaults field by field. Anything that isn't JSON
/// becomes the body text.
pub fn notification_from_push(payload: Option<&[u8]>, defaults: &NotificationDefaults) -> Notification {
    let mut notification = Notification {
        title: defaults.title.clone(),
        body: defaults.body.clone(),
        icon: defaults.icon.clone(),
        badge: defaults.badge.clone(),
        url: defaults.url.clone(),
    };

    let Some(payload) = payload else {
        return notification;
    };

    match serde_json::from_slice::<serde_json::Value>(payload) {
        Ok(serde_json::Value::Object(fields)) => {
            let text = |name: &str| fields.get(name).and_then(|v| v.as_str()).map(String::from);
            if let Some(title) = text("title") {
                notification.title = title;
            }
            if let Some(body) = text("body") {
                notification.body = body;
            }
            if let Some(url) = text("url") {
                notification.url = url;
            }
        }
        Ok(_) => {}
        Err(_) => notification.body = String::from_utf8_lossy(payload).into_owned(),
    }

    notification
}

/// Show the notification for a push. Never fails.
pub async fn on_push(
    host: &dyn ClientHost, payload: Option<&[u8]>, defaults: &NotificationDefaults,
) -> (u64, Notification) {
    let notification = notification_from_push(payload, defaults);
    let id = host.show_notification(notification.clone()).await;
    tracing::info!(id, title = %notification.title, url = %notification.url, "notification shown");
    (id, notification)
}

/// What a click did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", content = "view", rename_all = "snake_case")]
pub enum ClickAction {
    Focused(View),
    Opened(View),
}

/// Close the notification, then focus a view already at its target or open a new one.
pub async fn on_notification_click(host: &dyn ClientHost, id: u64, origin: &Url) -> Result<ClickAction, WorkerError> {
    let notification = host.close_notification(id).await.ok_or(WorkerError::UnknownNotification(id))?;

    let target = match resolve(origin, &notification.url) {
        Ok(url) => url.to_string(),
        Err(_) => notification.url.clone(),
    };

    for view in host.views().await {
        if view.url == target
            && let Some(view) = host.focus(&view.id).await
        {
            tracing::debug!(view = %view.id, url = %target, "focused view");
            return Ok(ClickAction::Focused(view));
        }
    }

    let view = host.open_window(&target).await;
    tracing::debug!(view = %view.id, url = %target, "opened view");
    Ok(ClickAction::Opened(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ViewRegistry;

    fn origin() -> Url {
        Url::parse("http://localhost:8080").unwrap()
    }

    #[test]
    fn test_non_json_payload_becomes_body() {
        let n = notification_from_push(Some(b"not json".as_slice()), &NotificationDefaults::default());
        assert_eq!(n.title, "Simple Recipe Book");
        assert_eq!(n.body, "not json");
        assert_eq!(n.url, "/");
    }

    #[test]
    fn test_json_fields_override_defaults() {
        let payload = br#"{"title":"Soup","url":"/recipes/3"}"#;
        let n = notification_from_push(Some(payload.as_slice()), &NotificationDefaults::default());
        assert_eq!(n.title, "Soup");
        assert_eq!(n.body, "New recipe available!");
        assert_eq!(n.url, "/recipes/3");
        assert_eq!(n.icon.as_deref(), Some("/icons/icon-192.png"));
        assert_eq!(n.badge.as_deref(), Some("/icons/icon-192.png"));
    }

    #[test]
    fn test_missing_payload_uses_defaults() {
        let n = notification_from_push(None, &NotificationDefaults::default());
        assert_eq!((n.title.as_str(), n.body.as_str(), n.url.as_str()), ("Simple Recipe Book", "New recipe available!", "/"));
    }

    #[test]
    fn test_non_object_json_keeps_defaults() {
        let n = notification_from_push(Some(b"[1,2]".as_slice()), &NotificationDefaults::default());
        assert_eq!(n.body, "New recipe available!");

        let n = notification_from_push(Some(br#"{"title": 5}"#.as_slice()), &NotificationDefaults::default());
        assert_eq!(n.title, "Simple Recipe Book");
    }

    #[tokio::test]
    async fn test_push_always_shows() {
        let host = ViewRegistry::new();
        let (id, shown) = on_push(&host, Some([0xffu8, 0xfe].as_slice()), &NotificationDefaults::default()).await;
        assert_eq!(host.notification(id).await, Some(shown));
    }

    #[tokio::test]
    async fn test_click_focuses_matching_view() {
        let host = ViewRegistry::new();
        host.sync_views(vec![("a".into(), "http://localhost:8080/recipes/3".into()), ("b".into(), "http://localhost:8080/".into())], true)
            .await;
        let (id, _) = on_push(&host, None, &NotificationDefaults::default()).await;

        let action = on_notification_click(&host, id, &origin()).await.unwrap();
        assert!(matches!(action, ClickAction::Focused(view) if view.id == "b" && view.focused));
        assert_eq!(host.views().await.len(), 2);
        assert_eq!(host.notification(id).await, None);
    }

    #[tokio::test]
    async fn test_click_opens_when_nothing_matches() {
        let host = ViewRegistry::new();
        host.sync_views(vec![("a".into(), "http://localhost:8080/recipes/3/edit".into())], true).await;
        let (id, _) = on_push(&host, Some(br#"{"url":"/recipes/3"}"#.as_slice()), &NotificationDefaults::default()).await;

        let action = on_notification_click(&host, id, &origin()).await.unwrap();
        assert!(matches!(action, ClickAction::Opened(view) if view.url == "http://localhost:8080/recipes/3"));
        assert_eq!(host.views().await.len(), 2);
    }

    #[tokio::test]
    async fn test_click_on_unknown_notification() {
        let host = ViewRegistry::new();
        let result = on_notification_click(&host, 42, &origin()).await;
        assert!(matches!(result, Err(WorkerError::UnknownNotification(42))));
        assert!(host.views().await.is_empty());
    }
}
