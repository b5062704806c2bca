//! Offline cache worker for the MitsuList catalog.
//!
//! Implements the install/activate/fetch lifecycle over a versioned cache
//! bucket: precache the application shell at install, evict stale buckets at
//! activation, then serve intercepted GET requests network-first with a
//! cache fallback.

pub mod worker;

pub use worker::{OfflineWorker, Served, WorkerConfig, WorkerState};
