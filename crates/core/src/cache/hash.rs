//! Cache entry key generation.

use sha2::{Digest, Sha256};

/// Compute the storage key for a cache entry.
///
/// Request identity is the full resource URL plus method, scoped to a
/// bucket so the same URL can coexist in buckets of different versions.
pub fn compute_entry_key(bucket: &str, method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bucket.as_bytes());
    hasher.update(b"\n");
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
