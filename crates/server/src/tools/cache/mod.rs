//! Cache inspection MCP tools.
//!
//! This module provides read-only views of the worker's namespaces.

pub mod get;
pub mod list;

pub use get::{CacheGetParams, get_impl};
pub use list::{CacheListParams, list_impl};
