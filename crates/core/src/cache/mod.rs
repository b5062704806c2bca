//! SQLite-backed store for versioned cache buckets.
//!
//! This module persists (request, response) pairs grouped into named,
//! versioned buckets, with async access via tokio-rusqlite. It supports:
//!
//! - Exactly-one-current-bucket lifecycle (create, populate, evict stale)
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Transactional batch writes for all-or-nothing precaching

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedResponse;
