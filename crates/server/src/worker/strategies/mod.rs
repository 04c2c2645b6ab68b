//! Request-handling strategies, one per [`RequestKind`].

mod default;
mod dynamic_data;
mod image;
mod navigation;

use async_trait::async_trait;
use larder_core::{Error, Request, Response};

use super::context::WorkerContext;
use super::router::RequestKind;

pub use default::CacheFirst;
pub use dynamic_data::NetworkFirst;
pub use image::StaleWhileRevalidate;
pub use navigation::AppShell;

/// Produces the response for one intercepted request.
///
/// An `Err` is only returned when network, stores and fallback assets all came up empty.
#[async_trait]
pub trait Strategy: Send + Sync {
    async fn respond(&self, ctx: &WorkerContext, request: &Request) -> Result<Response, Error>;
}

pub fn executor(kind: RequestKind) -> &'static dyn Strategy {
    match kind {
        RequestKind::Navigation => &AppShell,
        RequestKind::DynamicData => &NetworkFirst,
        RequestKind::Image => &StaleWhileRevalidate,
        RequestKind::Default => &CacheFirst,
    }
}

fn offline(request: &Request, cause: impl std::fmt::Display) -> Error {
    Error::Offline(format!("{}: {cause}", request.url))
}
