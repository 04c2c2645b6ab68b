//! Everything else: cache first, network second.

use async_trait::async_trait;
use larder_core::{Error, Request, Response};

use super::{Strategy, offline};
use crate::worker::context::WorkerContext;

pub struct CacheFirst;

#[async_trait]
impl Strategy for CacheFirst {
    async fn respond(&self, ctx: &WorkerContext, request: &Request) -> Result<Response, Error> {
        let key = request.key();
        if let Some(cached) = ctx.lookup(&key).await {
            return Ok(cached);
        }

        match ctx.network.fetch(request).await {
            Ok(response) => {
                // Opaque responses hide their real status.
                if response.status == 200 && !response.is_opaque() {
                    ctx.put_quietly(&ctx.runtime(), &key, &response).await;
                }
                Ok(response)
            }
            Err(e) if request.accepts_html() => {
                tracing::debug!(url = %request.url, error = %e, "fetch failed, serving offline page");
                ctx.offline_page().await.ok_or_else(|| offline(request, e))
            }
            Err(e) => Err(offline(request, e)),
        }
    }
}
