//! cache_purge tool implementation.
//!
//! Trims a store to a maximum entry count (FIFO), or drops it.

use larder_core::cache::trim;
use larder_core::{CacheStores, Error};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    pub store: String,

    /// Keep only the newest N entries.
    #[serde(default)]
    pub max_entries: Option<usize>,

    /// Delete the store with all its entries.
    #[serde(default)]
    pub drop: bool,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Entries removed by trimming.
    pub evicted: usize,
    pub dropped: bool,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(stores: &CacheStores, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    if params.max_entries.is_none() && !params.drop {
        return Err(Error::InvalidInput("At least one of max_entries or drop must be specified".to_string()).into());
    }

    let mut evicted = 0;
    if let Some(max_entries) = params.max_entries {
        evicted = trim(&stores.handle(&params.store), max_entries).await?;
    }

    let dropped = params.drop && stores.delete(&params.store).await?;
    if dropped {
        tracing::info!(store = %params.store, "dropped store");
    }

    json_result(&CachePurgeOutput { evicted, dropped })
}
