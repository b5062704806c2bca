//! Lifecycle state machine and fetch interception policy.
//!
//! The worker moves through `Installing -> Waiting -> Activating -> Active`.
//! Install precaches the application shell into the current bucket
//! (all-or-nothing); activate deletes every bucket whose name is not the
//! current version tag. Once active, intercepted GET requests are served
//! network-first: a successful same-origin 200 is persisted and returned,
//! anything else is returned uncached, and a network failure falls back to
//! an exact cache match.

use std::collections::BTreeMap;
use std::sync::Arc;

use mitsu_client::fetch::{FetchRequest, FetchResponse, Network, resolve};
use mitsu_client::{Method, StatusCode};
use mitsu_core::{AppConfig, CacheDb, CachedResponse, Error};
use url::Url;

/// Explicit configuration for a worker instance.
///
/// Bucket name, manifest, and bypass rules are passed in rather than read
/// from globals so the worker is testable with a fake network and an
/// in-memory cache store.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Name of the current cache bucket (the version tag).
    pub cache_name: String,
    /// Origin of the catalog site; responses landing elsewhere are never cached.
    pub origin: Url,
    /// Application-shell paths precached at install time.
    pub precache: Vec<String>,
    /// URL substrings that bypass the cache entirely.
    pub bypass_segments: Vec<String>,
}

impl WorkerConfig {
    /// Build a worker configuration from the loaded application config.
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin)
            .map_err(|e| Error::InvalidUrl(format!("origin {}: {}", config.origin, e)))?;
        Ok(Self {
            cache_name: config.cache_name.clone(),
            origin,
            precache: config.precache.clone(),
            bypass_segments: config.bypass_segments.clone(),
        })
    }
}

/// Worker lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    Waiting,
    Activating,
    Active,
}

/// A response handed back to the caller.
///
/// Either fresh from the network or replayed from the offline cache; both
/// carry a status and a body the caller can consume independently of any
/// persisted copy.
#[derive(Debug)]
pub enum Served {
    Network(FetchResponse),
    Offline(CachedResponse),
}

impl Served {
    pub fn status(&self) -> u16 {
        match self {
            Served::Network(resp) => resp.status.as_u16(),
            Served::Offline(entry) => entry.status,
        }
    }

    pub fn body(&self) -> &[u8] {
        match self {
            Served::Network(resp) => &resp.bytes,
            Served::Offline(entry) => &entry.body,
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            Served::Network(_) => "network",
            Served::Offline(_) => "cache",
        }
    }
}

/// The offline cache worker.
pub struct OfflineWorker {
    config: WorkerConfig,
    db: CacheDb,
    net: Arc<dyn Network>,
    state: WorkerState,
}

impl OfflineWorker {
    /// Create a worker in the `Installing` state.
    pub fn new(config: WorkerConfig, db: CacheDb, net: Arc<dyn Network>) -> Self {
        Self { config, db, net, state: WorkerState::Installing }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Install: create the current bucket and precache the manifest.
    ///
    /// Every manifest path must fetch successfully; a single failure aborts
    /// the attempt and leaves the bucket unpopulated. Entries are written in
    /// one transaction only after all fetches succeed, so no partial bucket
    /// is ever observable. On success the worker requests immediate
    /// takeover (no waiting-period coexistence with a prior instance).
    pub async fn install(&mut self) -> Result<(), Error> {
        if self.state != WorkerState::Installing {
            return Err(Error::InvalidState(format!("install called in {:?} state", self.state)));
        }

        self.db.ensure_bucket(&self.config.cache_name).await?;

        let mut entries = Vec::with_capacity(self.config.precache.len());
        for path in &self.config.precache {
            let url = resolve(&self.config.origin, path).map_err(|e| Error::InvalidUrl(e.to_string()))?;
            let req = FetchRequest::get(url);
            let resp = self
                .net
                .fetch(&req)
                .await
                .map_err(|e| Error::PrecacheFailed(format!("{}: {}", path, e)))?;

            if !resp.status.is_success() {
                return Err(Error::PrecacheFailed(format!("{}: status {}", path, resp.status.as_u16())));
            }

            entries.push(entry_from_response(&self.config.cache_name, &req, &resp));
        }

        self.db.put_entries(entries).await?;

        tracing::info!(
            bucket = %self.config.cache_name,
            entries = self.config.precache.len(),
            "install complete, skipping waiting period"
        );
        self.state = WorkerState::Waiting;
        Ok(())
    }

    /// Activate: evict every bucket not matching the current version tag.
    ///
    /// The current bucket is preserved untouched. Once active the worker
    /// takes over fetch handling immediately.
    pub async fn activate(&mut self) -> Result<(), Error> {
        if self.state != WorkerState::Waiting {
            return Err(Error::InvalidState(format!("activate called in {:?} state", self.state)));
        }
        self.state = WorkerState::Activating;

        for name in self.db.bucket_names().await? {
            if name != self.config.cache_name {
                self.db.delete_bucket(&name).await?;
                tracing::info!(bucket = %name, "deleted stale cache bucket");
            }
        }

        self.state = WorkerState::Active;
        tracing::info!(bucket = %self.config.cache_name, "activated, claiming clients");
        Ok(())
    }

    /// Handle one intercepted request.
    ///
    /// Only GET requests participate in caching; requests whose URL contains
    /// a bypass segment go straight to the network regardless of any cached
    /// entry. Everything else is network-first with cache fallback.
    pub async fn handle_fetch(&self, req: &FetchRequest) -> Result<Served, Error> {
        if self.state != WorkerState::Active {
            return Err(Error::InvalidState(format!("fetch handled in {:?} state", self.state)));
        }

        if req.method != Method::GET {
            return self.net.fetch(req).await.map(Served::Network);
        }

        if self.is_bypass(req.url.as_str()) {
            tracing::debug!(url = %req.url, "bypassing cache");
            return self.net.fetch(req).await.map(Served::Network);
        }

        match self.net.fetch(req).await {
            Ok(resp) => {
                if resp.status == StatusCode::OK && resp.is_same_origin(&self.config.origin) {
                    // Bytes are cheaply cloneable, so the persisted copy and
                    // the served copy are independent readers of one body.
                    let entry = entry_from_response(&self.config.cache_name, req, &resp);
                    if let Err(e) = self.db.put_entry(&entry).await {
                        tracing::warn!(url = %req.url, error = %e, "cache write failed, serving response anyway");
                    }
                }
                Ok(Served::Network(resp))
            }
            Err(net_err) => match self
                .db
                .match_entry(&self.config.cache_name, req.method.as_str(), req.url.as_str())
                .await
            {
                Ok(Some(entry)) => {
                    tracing::debug!(url = %req.url, "network failed, serving from cache");
                    Ok(Served::Offline(entry))
                }
                // A miss and a cache backend error propagate the same
                // network failure; callers can't tell them apart.
                Ok(None) => Err(net_err),
                Err(cache_err) => {
                    tracing::debug!(url = %req.url, error = %cache_err, "cache lookup failed after network failure");
                    Err(net_err)
                }
            },
        }
    }

    fn is_bypass(&self, url: &str) -> bool {
        self.config.bypass_segments.iter().any(|segment| url.contains(segment))
    }
}

fn entry_from_response(bucket: &str, req: &FetchRequest, resp: &FetchResponse) -> CachedResponse {
    CachedResponse::new(
        bucket,
        req.method.as_str(),
        req.url.as_str(),
        resp.status.as_u16(),
        resp.content_type.clone(),
        headers_json(resp),
        resp.bytes.to_vec(),
    )
}

fn headers_json(resp: &FetchResponse) -> Option<String> {
    let map: BTreeMap<&str, &str> = resp
        .headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
        .collect();
    if map.is_empty() { None } else { serde_json::to_string(&map).ok() }
}
