//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting and shrinking the named stores.

pub mod keys;
pub mod purge;
pub mod stores;

pub use keys::{CacheKeysParams, keys_impl};
pub use purge::{CachePurgeParams, purge_impl};
pub use stores::stores_impl;
