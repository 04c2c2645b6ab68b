//! Network client for larder.
//!
//! This crate provides the fetch seam the worker intercepts in front of,
//! plus URL resolution against the application origin.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, Network, UrlError, is_same_origin, resolve, response_kind};
