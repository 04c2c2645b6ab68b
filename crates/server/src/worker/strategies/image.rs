//! Images: cache first with background refresh, bounded runtime store.

use async_trait::async_trait;
use larder_core::{Error, Request, Response};

use super::{Strategy, offline};
use crate::worker::context::{WorkerContext, is_cacheable_image};

pub struct StaleWhileRevalidate;

#[async_trait]
impl Strategy for StaleWhileRevalidate {
    async fn respond(&self, ctx: &WorkerContext, request: &Request) -> Result<Response, Error> {
        let key = request.key();

        if let Some(cached) = ctx.lookup(&key).await {
            ctx.revalidate_in_background(request.clone()).await;
            return Ok(cached);
        }

        match ctx.network.fetch(request).await {
            Ok(response) => {
                if is_cacheable_image(&response) && ctx.put_quietly(&ctx.runtime(), &key, &response).await {
                    ctx.trim_runtime().await;
                }
                Ok(response)
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "image fetch failed, serving placeholder");
                ctx.placeholder().await.ok_or_else(|| offline(request, e))
            }
        }
    }
}
