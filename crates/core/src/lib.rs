//! Core types and shared functionality for mitsu-sw.
//!
//! This crate provides:
//! - Versioned cache-bucket store with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CachedResponse};
pub use config::AppConfig;
pub use error::Error;
