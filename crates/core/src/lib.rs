//! Core types and shared functionality for offgrid.
//!
//! This crate provides:
//! - Durable cache namespaces with a SQLite backend
//! - The request/response model shared by the worker and its collaborators
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod message;

pub use cache::{CacheDb, EntryMeta, Namespace};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use message::{Request, Response};
