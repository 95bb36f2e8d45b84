//! SQLite-backed cache namespaces.
//!
//! This module provides durable, named request/response stores using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Named namespaces, enumerated in creation order
//! - Content-addressed entry keys using SHA-256 hashing
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Whole-namespace deletion as the only eviction

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod namespaces;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::EntryMeta;
pub use namespaces::Namespace;
