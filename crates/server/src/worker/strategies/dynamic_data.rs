//! Record data and API calls: network first, cached copy when offline.

use async_trait::async_trait;
use larder_core::{Error, Request, Response};

use super::{Strategy, offline};
use crate::worker::context::WorkerContext;

pub struct NetworkFirst;

#[async_trait]
impl Strategy for NetworkFirst {
    async fn respond(&self, ctx: &WorkerContext, request: &Request) -> Result<Response, Error> {
        let err = match ctx.network.fetch(request).await {
            Ok(response) => {
                ctx.put_quietly(&ctx.runtime(), &request.key(), &response).await;
                return Ok(response);
            }
            Err(e) => e,
        };

        tracing::debug!(url = %request.url, error = %err, "data fetch failed, trying stores");
        if let Some(cached) = ctx.lookup(&request.key()).await {
            return Ok(cached);
        }
        ctx.offline_page().await.ok_or_else(|| offline(request, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingStorage, StubNetwork, context, context_with};
    use larder_core::AppConfig;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    const DATA: &str = "http://localhost:8080/api/recipes";

    #[tokio::test]
    async fn test_success_overwrites_runtime_entry() {
        let network = Arc::new(StubNetwork::new());
        let ctx = context(network.clone());
        let request = network.request("/api/recipes");

        network.serve("/api/recipes", Response::new(DATA, 200, "[1]"));
        NetworkFirst.respond(&ctx, &request).await.unwrap();
        network.serve("/api/recipes", Response::new(DATA, 200, "[1,2]"));
        let response = NetworkFirst.respond(&ctx, &request).await.unwrap();

        assert_eq!(response.body, "[1,2]");
        let stored = ctx.runtime().get(&request.key()).await.unwrap().unwrap();
        assert_eq!(stored.body, "[1,2]");
        assert_eq!(ctx.runtime().keys().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_identical_refresh_moves_entry_to_end() {
        let network = Arc::new(StubNetwork::new());
        let ctx = context(network.clone());
        network.serve("/api/recipes", Response::new(DATA, 200, "[1]"));
        network.serve("/api/recipes/2", Response::new("http://localhost:8080/api/recipes/2", 200, "{}"));

        let first = network.request("/api/recipes");
        let second = network.request("/api/recipes/2");
        NetworkFirst.respond(&ctx, &first).await.unwrap();
        NetworkFirst.respond(&ctx, &second).await.unwrap();
        let before = ctx.runtime().get(&first.key()).await.unwrap();
        NetworkFirst.respond(&ctx, &first).await.unwrap();

        assert_eq!(ctx.runtime().get(&first.key()).await.unwrap(), before);
        assert_eq!(ctx.runtime().keys().await.unwrap(), vec![second.key(), first.key()]);
    }

    #[tokio::test]
    async fn test_any_status_is_written() {
        let network = Arc::new(StubNetwork::new());
        let ctx = context(network.clone());
        let request = network.request("/api/recipes/404");

        let response = NetworkFirst.respond(&ctx, &request).await.unwrap();
        assert_eq!(response.status, 404);
        assert!(ctx.runtime().get(&request.key()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_offline_serves_precached_data_file() {
        let network = Arc::new(StubNetwork::new());
        let ctx = context(network.clone());
        let request = network.request("/recipes.json");
        ctx.precache().put(&request.key(), &Response::new("/recipes.json", 200, "[precached]")).await.unwrap();

        network.go_offline();
        let response = NetworkFirst.respond(&ctx, &request).await.unwrap();
        assert_eq!(response.body, "[precached]");
    }

    #[tokio::test]
    async fn test_offline_falls_back_to_offline_page() {
        let network = Arc::new(StubNetwork::new());
        let ctx = context(network.clone());
        ctx.precache().put(&ctx.settings.offline_page, &Response::new("/offline.html", 200, "offline")).await.unwrap();

        network.go_offline();
        let response = NetworkFirst.respond(&ctx, &network.request("/api/recipes/9")).await.unwrap();
        assert_eq!(response.body, "offline");
    }

    #[tokio::test]
    async fn test_offline_with_nothing_cached() {
        let network = Arc::new(StubNetwork::new());
        network.go_offline();
        let ctx = context(network.clone());

        let result = NetworkFirst.respond(&ctx, &network.request("/api/recipes")).await;
        assert!(matches!(result, Err(Error::Offline(msg)) if msg.contains("/api/recipes")));
    }

    #[tokio::test]
    async fn test_store_failure_does_not_abort() {
        let network = Arc::new(StubNetwork::new());
        network.serve("/api/recipes", Response::new(DATA, 200, "[1]"));
        let storage = Arc::new(FailingStorage::new());
        storage.fail_writes.store(true, Ordering::SeqCst);
        let ctx = context_with(network.clone(), storage, &AppConfig::default());

        let response = NetworkFirst.respond(&ctx, &network.request("/api/recipes")).await.unwrap();
        assert_eq!(response.body, "[1]");
    }
}
