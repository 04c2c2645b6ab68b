//! Store manager: named store handles over an injected backend.

use std::fmt;
use std::sync::Arc;

use super::storage::CacheStorage;
use crate::{Error, RequestKey, Response};

/// Opens, lists and deletes named stores.
///
/// Cheap to clone; all clones share one backend.
#[derive(Clone)]
pub struct CacheStores {
    backend: Arc<dyn CacheStorage>,
}

impl CacheStores {
    pub fn new(backend: Arc<dyn CacheStorage>) -> Self {
        Self { backend }
    }

    /// Open a store, creating it if absent.
    pub async fn open(&self, name: &str) -> Result<Store, Error> {
        self.backend.open_store(name).await?;
        Ok(self.handle(name))
    }

    /// Handle to a store without touching the backend.
    ///
    /// Reads on a store that doesn't exist come back empty; the first write creates it.
    pub fn handle(&self, name: &str) -> Store {
        Store { name: name.to_string(), backend: Arc::clone(&self.backend) }
    }

    /// Store names in creation order.
    pub async fn names(&self) -> Result<Vec<String>, Error> {
        self.backend.store_names().await
    }

    pub async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.backend.delete_store(name).await
    }

    /// First entry for `key` across all stores.
    pub async fn match_any(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        self.backend.match_any(key).await
    }
}

impl fmt::Debug for CacheStores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStores").finish_non_exhaustive()
    }
}

/// One named store.
#[derive(Clone)]
pub struct Store {
    name: String,
    backend: Arc<dyn CacheStorage>,
}

impl Store {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn get(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        self.backend.get(&self.name, key).await
    }

    pub async fn put(&self, key: &RequestKey, response: &Response) -> Result<(), Error> {
        self.backend.put(&self.name, key, response).await
    }

    pub async fn put_all(&self, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        self.backend.put_all(&self.name, entries).await
    }

    pub async fn delete(&self, key: &RequestKey) -> Result<bool, Error> {
        self.backend.delete(&self.name, key).await
    }

    pub async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        self.backend.keys(&self.name).await
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store").field("name", &self.name).finish_non_exhaustive()
    }
}
