//! The interception layer: routing, strategies, lifecycle and notifications.

pub mod context;
pub mod lifecycle;
pub mod notifications;
pub mod router;
pub mod service;
pub mod strategies;

pub use context::{WorkerContext, WorkerSettings};
pub use lifecycle::{Registration, WorkerMessage};
pub use notifications::{ClickAction, Notification, on_notification_click, on_push};
pub use router::RequestKind;
pub use service::{FetchOutcome, ServiceWorker, WorkerState};
