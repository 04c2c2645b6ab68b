//! cache_stores tool implementation.
//!
//! Lists every store in creation order with its entry count.

use larder_core::CacheStores;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreSummary {
    pub name: String,
    pub entries: usize,
}

/// Output from the cache_stores tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoresOutput {
    pub stores: Vec<StoreSummary>,
}

/// Implementation of the cache_stores tool.
pub async fn stores_impl(stores: &CacheStores) -> Result<CallToolResult, McpError> {
    let mut summaries = Vec::new();
    for name in stores.names().await? {
        let entries = stores.handle(&name).keys().await?.len();
        summaries.push(StoreSummary { name, entries });
    }

    json_result(&CacheStoresOutput { stores: summaries })
}
