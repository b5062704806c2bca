//! Client code for mitsu-sw.
//!
//! This crate provides the HTTP fetch pipeline used by the offline cache
//! worker, the injectable `Network` seam, and the remote anime search API
//! client.

pub mod fetch;
pub mod jikan;

pub use fetch::{FetchClient, FetchConfig, FetchRequest, FetchResponse, Network};
pub use jikan::{JikanClient, JikanConfig, JikanError};

pub use reqwest::{Method, StatusCode, header::HeaderMap};
