//! The application side the worker talks back to: open views and notifications.

use std::collections::BTreeMap;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::worker::Notification;

/// One open application view (a window or tab).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct View {
    pub id: String,
    pub url: String,
    /// Whether requests from this view are intercepted.
    pub controlled: bool,
    pub focused: bool,
}

#[async_trait]
pub trait ClientHost: Send + Sync {
    /// Take control of every open view. Returns how many were newly claimed.
    async fn claim(&self) -> usize;

    /// Whether requests from `view_id` go through the worker. Unknown views count as controlled.
    async fn is_controlled(&self, view_id: &str) -> bool;

    /// All open views, controlled or not.
    async fn views(&self) -> Vec<View>;

    async fn focus(&self, view_id: &str) -> Option<View>;

    async fn open_window(&self, url: &str) -> View;

    async fn show_notification(&self, notification: Notification) -> u64;

    async fn close_notification(&self, id: u64) -> Option<Notification>;
}

/// Shown notifications kept for clicks; older ones are closed when a new one exceeds this.
const MAX_SHOWN_NOTIFICATIONS: usize = 32;

#[derive(Debug, Default)]
struct Registry {
    views: Vec<View>,
    notifications: BTreeMap<u64, Notification>,
    next_view: u64,
    next_notification: u64,
}

/// In-process host, kept in sync by whatever embeds the worker.
#[derive(Debug, Default)]
pub struct ViewRegistry {
    inner: Mutex<Registry>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the view list with what the application reports.
    ///
    /// Views already known keep their controlled flag; new ones get `controlled`.
    pub async fn sync_views(&self, reported: Vec<(String, String)>, controlled: bool) -> Vec<View> {
        let mut inner = self.inner.lock().await;
        let previous = std::mem::take(&mut inner.views);

        inner.views = reported
            .into_iter()
            .map(|(id, url)| match previous.iter().find(|v| v.id == id) {
                Some(known) => View { url, ..known.clone() },
                None => View { id, url, controlled, focused: false },
            })
            .collect();

        inner.views.clone()
    }

    /// A shown notification that hasn't been closed yet.
    pub async fn notification(&self, id: u64) -> Option<Notification> {
        self.inner.lock().await.notifications.get(&id).cloned()
    }
}

#[async_trait]
impl ClientHost for ViewRegistry {
    async fn claim(&self) -> usize {
        let mut inner = self.inner.lock().await;
        let mut claimed = 0;
        for view in inner.views.iter_mut().filter(|v| !v.controlled) {
            view.controlled = true;
            claimed += 1;
        }
        claimed
    }

    async fn is_controlled(&self, view_id: &str) -> bool {
        let inner = self.inner.lock().await;
        inner.views.iter().find(|v| v.id == view_id).is_none_or(|v| v.controlled)
    }

    async fn views(&self) -> Vec<View> {
        self.inner.lock().await.views.clone()
    }

    async fn focus(&self, view_id: &str) -> Option<View> {
        let mut inner = self.inner.lock().await;
        inner.views.iter().position(|v| v.id == view_id)?;
        for view in inner.views.iter_mut() {
            view.focused = view.id == view_id;
        }
        inner.views.iter().find(|v| v.id == view_id).cloned()
    }

    async fn open_window(&self, url: &str) -> View {
        let mut inner = self.inner.lock().await;
        inner.next_view += 1;
        let view = View { id: format!("view-{}", inner.next_view), url: url.to_string(), controlled: true, focused: true };
        for other in inner.views.iter_mut() {
            other.focused = false;
        }
        inner.views.push(view.clone());
        view
    }

    async fn show_notification(&self, notification: Notification) -> u64 {
        let mut inner = self.inner.lock().await;
        inner.next_notification += 1;
        let id = inner.next_notification;
        inner.notifications.insert(id, notification);
        while inner.notifications.len() > MAX_SHOWN_NOTIFICATIONS {
            if let Some((closed, _)) = inner.notifications.pop_first() {
                tracing::debug!(id = closed, "closed oldest notification");
            }
        }
        id
    }

    async fn close_notification(&self, id: u64) -> Option<Notification> {
        self.inner.lock().await.notifications.remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(title: &str) -> Notification {
        Notification {
            title: title.to_string(),
            body: String::new(),
            icon: None,
            badge: None,
            url: "/".to_string(),
        }
    }

    #[tokio::test]
    async fn test_unclicked_notifications_are_bounded() {
        let host = ViewRegistry::new();
        let mut ids = Vec::new();
        for i in 0..MAX_SHOWN_NOTIFICATIONS + 3 {
            ids.push(host.show_notification(note(&format!("n{i}"))).await);
        }

        assert_eq!(host.inner.lock().await.notifications.len(), MAX_SHOWN_NOTIFICATIONS);
        assert!(host.notification(ids[2]).await.is_none());
        assert_eq!(host.notification(ids[3]).await.map(|n| n.title), Some("n3".to_string()));
        assert!(host.close_notification(ids[ids.len() - 1]).await.is_some());
    }

    fn report(views: &[(&str, &str)]) -> Vec<(String, String)> {
        views.iter().map(|(id, url)| (id.to_string(), url.to_string())).collect()
    }

    #[tokio::test]
    async fn test_claim_takes_uncontrolled_views() {
        let host = ViewRegistry::new();
        host.sync_views(report(&[("a", "http://localhost:8080/"), ("b", "http://localhost:8080/about")]), false).await;
        assert!(!host.is_controlled("a").await);

        assert_eq!(host.claim().await, 2);
        assert!(host.is_controlled("a").await);
        assert!(host.is_controlled("b").await);
        assert_eq!(host.claim().await, 0);
    }

    #[tokio::test]
    async fn test_sync_keeps_known_flags() {
        let host = ViewRegistry::new();
        host.sync_views(report(&[("a", "http://localhost:8080/")]), false).await;
        host.claim().await;

        let views = host.sync_views(report(&[("a", "http://localhost:8080/next"), ("c", "http://localhost:8080/")]), false).await;
        assert_eq!(views.len(), 2);
        assert!(views[0].controlled);
        assert_eq!(views[0].url, "http://localhost:8080/next");
        assert!(!views[1].controlled);
    }

    #[tokio::test]
    async fn test_unknown_view_counts_as_controlled() {
        let host = ViewRegistry::new();
        assert!(host.is_controlled("nobody").await);
    }

    #[tokio::test]
    async fn test_focus_moves_between_views() {
        let host = ViewRegistry::new();
        host.sync_views(report(&[("a", "http://localhost:8080/"), ("b", "http://localhost:8080/x")]), true).await;

        assert!(host.focus("b").await.is_some());
        assert!(host.focus("missing").await.is_none());
        let focused: Vec<String> = host.views().await.into_iter().filter(|v| v.focused).map(|v| v.id).collect();
        assert_eq!(focused, vec!["b"]);
    }

    #[tokio::test]
    async fn test_notifications_close_once() {
        let host = ViewRegistry::new();
        let notification = Notification {
            title: "t".into(),
            body: "b".into(),
            icon: None,
            badge: None,
            url: "/".into(),
        };
        let id = host.show_notification(notification.clone()).await;
        assert_eq!(host.close_notification(id).await, Some(notification));
        assert_eq!(host.close_notification(id).await, None);
    }
}
