//! FIFO eviction for size-bounded stores.
//!
//! Order is insertion order only. Reads never refresh an entry's position.

use async_trait::async_trait;
use futures_util::future::join_all;

use super::manager::Store;
use crate::{Error, RequestKey};

/// Anything that can list its keys oldest-first and delete by key.
#[async_trait]
pub trait OrderedKeys: Send + Sync {
    type Key: Send + Sync;

    async fn ordered_keys(&self) -> Result<Vec<Self::Key>, Error>;

    async fn remove(&self, key: &Self::Key) -> Result<bool, Error>;
}

#[async_trait]
impl OrderedKeys for Store {
    type Key = RequestKey;

    async fn ordered_keys(&self) -> Result<Vec<RequestKey>, Error> {
        self.keys().await
    }

    async fn remove(&self, key: &RequestKey) -> Result<bool, Error> {
        self.delete(key).await
    }
}

/// The oldest `len - max_items` keys, or nothing when within bounds.
pub fn eviction_plan<K>(keys: &[K], max_items: usize) -> &[K] {
    &keys[..keys.len().saturating_sub(max_items)]
}

/// Shrink `store` to at most `max_items` entries, oldest first.
///
/// Deletions run concurrently. A failed deletion is logged and skipped, so the
/// store may stay above the bound until the next trim. Returns how many entries
/// were actually removed.
pub async fn trim<S>(store: &S, max_items: usize) -> Result<usize, Error>
where
    S: OrderedKeys + ?Sized,
{
    let keys = store.ordered_keys().await?;
    let victims = eviction_plan(&keys, max_items);
    if victims.is_empty() {
        return Ok(0);
    }

    let results = join_all(victims.iter().map(|key| store.remove(key))).await;

    let mut evicted = 0;
    for result in results {
        match result {
            Ok(true) => evicted += 1,
            Ok(false) => {}
            Err(e) => tracing::debug!(error = %e, "eviction delete failed"),
        }
    }

    tracing::debug!(evicted, max_items, "trimmed store");
    Ok(evicted)
}
