//! Named response stores with a SQLite backend.
//!
//! This module provides the store manager used by the worker:
//!
//! - Request identities hashed with SHA-256 for on-disk keys
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Insertion-ordered entries with replace-moves-to-end semantics
//! - FIFO eviction for size-bounded stores
//! - An in-memory backend behind the same trait

pub mod connection;
pub mod entries;
pub mod eviction;
pub mod hash;
pub mod manager;
pub mod migrations;
pub mod storage;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use eviction::{OrderedKeys, eviction_plan, trim};
pub use manager::{CacheStores, Store};
pub use storage::{CacheStorage, MemoryStorage};
pub use stores::StoreInfo;
