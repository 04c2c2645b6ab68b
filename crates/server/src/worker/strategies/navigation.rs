//! Page navigations: network first, offline page on failure.

use async_trait::async_trait;
use larder_core::{Error, Request, Response};

use super::{Strategy, offline};
use crate::worker::context::WorkerContext;

pub struct AppShell;

#[async_trait]
impl Strategy for AppShell {
    async fn respond(&self, ctx: &WorkerContext, request: &Request) -> Result<Response, Error> {
        match ctx.network.fetch(request).await {
            Ok(response) => {
                // Every navigation refreshes the shell entry, whatever page was requested.
                ctx.put_quietly(&ctx.precache(), &ctx.settings.app_shell, &response).await;
                Ok(response)
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "navigation failed, serving offline page");
                ctx.offline_page().await.ok_or_else(|| offline(request, e))
            }
        }
    }
}
