//! Core types and shared functionality for larder.
//!
//! This crate provides:
//! - Named response stores with SQLite and in-memory backends
//! - FIFO eviction
//! - Request/response types shared by the network client and the worker
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod request;
pub mod response;

pub use cache::{CacheDb, CacheStorage, CacheStores, MemoryStorage, Store, StoreInfo};
pub use config::{AppConfig, ConfigError, NotificationDefaults};
pub use error::Error;
pub use request::{Request, RequestKey, RequestMode};
pub use response::{Response, ResponseKind};
