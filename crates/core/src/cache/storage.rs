//! Storage backend trait and its two implementations.
//!
//! The worker only sees [`CacheStorage`]; production wires in the SQLite
//! [`CacheDb`], tests and embedders can use [`MemoryStorage`].

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::connection::CacheDb;
use crate::{Error, RequestKey, Response};

/// Backend for named key-to-response stores.
///
/// Every mutation is atomic at the key level. Writing into a store that
/// doesn't exist yet creates it.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the store if absent.
    async fn open_store(&self, name: &str) -> Result<(), Error>;

    /// Store names in creation order.
    async fn store_names(&self) -> Result<Vec<String>, Error>;

    /// Delete a store with all entries. Returns false if it didn't exist.
    async fn delete_store(&self, name: &str) -> Result<bool, Error>;

    async fn get(&self, store: &str, key: &RequestKey) -> Result<Option<Response>, Error>;

    /// First match across all stores, searched in creation order.
    async fn match_any(&self, key: &RequestKey) -> Result<Option<Response>, Error>;

    /// Replace the entry; it takes the newest insertion position.
    async fn put(&self, store: &str, key: &RequestKey, response: &Response) -> Result<(), Error>;

    /// All-or-nothing bulk replace.
    async fn put_all(&self, store: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error>;

    async fn delete(&self, store: &str, key: &RequestKey) -> Result<bool, Error>;

    /// Keys in insertion order, oldest first.
    async fn keys(&self, store: &str) -> Result<Vec<RequestKey>, Error>;
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open_store(&self, name: &str) -> Result<(), Error> {
        CacheDb::open_store(self, name).await
    }

    async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.list_stores().await
    }

    async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        self.drop_store(name).await
    }

    async fn get(&self, store: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        self.get_entry(store, key).await
    }

    async fn match_any(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        self.match_entry(key).await
    }

    async fn put(&self, store: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        self.put_entry(store, key, response).await
    }

    async fn put_all(&self, store: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        self.put_entries(store, entries).await
    }

    async fn delete(&self, store: &str, key: &RequestKey) -> Result<bool, Error> {
        self.delete_entry(store, key).await
    }

    async fn keys(&self, store: &str) -> Result<Vec<RequestKey>, Error> {
        self.entry_keys(store).await
    }
}

/// In-memory storage. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    stores: Mutex<Vec<MemoryStore>>,
}

#[derive(Debug)]
struct MemoryStore {
    name: String,
    entries: Vec<(RequestKey, Response)>,
}

impl MemoryStore {
    fn upsert(&mut self, key: &RequestKey, response: &Response) {
        self.entries.retain(|(k, _)| k != key);
        self.entries.push((key.clone(), response.clone()));
    }
}

fn store_mut<'a>(stores: &'a mut Vec<MemoryStore>, name: &str) -> &'a mut MemoryStore {
    let index = match stores.iter().position(|s| s.name == name) {
        Some(index) => index,
        None => {
            stores.push(MemoryStore { name: name.to_string(), entries: Vec::new() });
            stores.len() - 1
        }
    };
    &mut stores[index]
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open_store(&self, name: &str) -> Result<(), Error> {
        store_mut(&mut *self.stores.lock().await, name);
        Ok(())
    }

    async fn store_names(&self) -> Result<Vec<String>, Error> {
        Ok(self.stores.lock().await.iter().map(|s| s.name.clone()).collect())
    }

    async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let mut stores = self.stores.lock().await;
        let before = stores.len();
        stores.retain(|s| s.name != name);
        Ok(stores.len() < before)
    }

    async fn get(&self, store: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        let stores = self.stores.lock().await;
        Ok(stores
            .iter()
            .find(|s| s.name == store)
            .and_then(|s| s.entries.iter().find(|(k, _)| k == key))
            .map(|(_, response)| response.clone()))
    }

    async fn match_any(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        let stores = self.stores.lock().await;
        Ok(stores.iter().find_map(|s| s.entries.iter().find(|(k, _)| k == key)).map(|(_, response)| response.clone()))
    }

    async fn put(&self, store: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        store_mut(&mut *self.stores.lock().await, store).upsert(key, response);
        Ok(())
    }

    async fn put_all(&self, store: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        let mut stores = self.stores.lock().await;
        let target = store_mut(&mut stores, store);
        for (key, response) in entries {
            target.upsert(key, response);
        }
        Ok(())
    }

    async fn delete(&self, store: &str, key: &RequestKey) -> Result<bool, Error> {
        let mut stores = self.stores.lock().await;
        let Some(target) = stores.iter_mut().find(|s| s.name == store) else {
            return Ok(false);
        };
        let before = target.entries.len();
        target.entries.retain(|(k, _)| k != key);
        Ok(target.entries.len() < before)
    }

    async fn keys(&self, store: &str) -> Result<Vec<RequestKey>, Error> {
        let stores = self.stores.lock().await;
        Ok(stores
            .iter()
            .find(|s| s.name == store)
            .map(|s| s.entries.iter().map(|(k, _)| k.clone()).collect())
            .unwrap_or_default())
    }
}
