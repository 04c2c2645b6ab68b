//! cache_keys tool implementation.
//!
//! Lists the keys of one store, oldest first.

use larder_core::{CacheStores, Error, RequestKey};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Store name, e.g. "simple-recipe-book-runtime-v1".
    pub store: String,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub store: String,
    /// Keys in insertion order; the first one is evicted first.
    pub keys: Vec<RequestKey>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(stores: &CacheStores, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    if !stores.names().await?.contains(&params.store) {
        return Err(Error::CacheMiss(format!("no store named {}", params.store)).into());
    }

    let keys = stores.handle(&params.store).keys().await?;
    json_result(&CacheKeysOutput { store: params.store, keys })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::output_json;
    use larder_core::{MemoryStorage, Response};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_keys_impl_missing_store() {
        let stores = CacheStores::new(Arc::new(MemoryStorage::new()));
        let params = CacheKeysParams { store: "nonexistent".to_string() };

        let result = keys_impl(&stores, params).await;
        assert_eq!(result.unwrap_err().code.0, -32001);
    }

    #[tokio::test]
    async fn test_keys_impl_insertion_order() {
        let stores = CacheStores::new(Arc::new(MemoryStorage::new()));
        let store = stores.open("runtime-v1").await.unwrap();
        let key = |path: &str| RequestKey { method: "GET".into(), url: format!("http://localhost:8080{path}") };
        for path in ["/a.png", "/b.png", "/a.png"] {
            store.put(&key(path), &Response::new(path, 200, "img")).await.unwrap();
        }

        let out = output_json(&keys_impl(&stores, CacheKeysParams { store: "runtime-v1".into() }).await.unwrap());
        let urls: Vec<&str> = out["keys"].as_array().unwrap().iter().map(|k| k["url"].as_str().unwrap()).collect();
        assert_eq!(urls, vec!["http://localhost:8080/b.png", "http://localhost:8080/a.png"]);
    }
}
