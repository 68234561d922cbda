//! Caching strategies and their execution.
//!
//! Store failures never fail a response: a failed read is a miss and a
//! failed write is logged. Only a network failure with nothing cached
//! reaches the caller.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use url::Url;

use super::config::Placement;
use super::route::{AssetClass, Route};
use crate::fetch::{Network, Request};
use shellcache_core::cache::RequestKey;
use shellcache_core::{CacheDb, Error, ResponseSnapshot, ResponseType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    NetworkOnly,
    CacheFirst,
    StaleWhileRevalidate,
}

impl Strategy {
    pub fn for_class(class: AssetClass) -> Self {
        match class {
            AssetClass::Analytics | AssetClass::TranslationService | AssetClass::Unclassified => Strategy::NetworkOnly,
            AssetClass::FontBinary => Strategy::CacheFirst,
            AssetClass::FontStylesheet | AssetClass::OwnOriginStatic => Strategy::StaleWhileRevalidate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Cache,
    Network,
}

/// A response handed back to the page.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub response: ResponseSnapshot,
    pub source: ResponseSource,
    pub route: Route,
}

/// Runs strategies against the store and the network.
#[derive(Clone)]
pub struct Executor {
    db: CacheDb,
    network: Arc<dyn Network>,
    origin: Url,
    refreshes: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Executor {
    pub fn new(db: CacheDb, network: Arc<dyn Network>, origin: Url) -> Self {
        Self { db, network, origin, refreshes: Arc::new(Mutex::new(Vec::new())) }
    }

    /// Fetch from the network and stamp the response type against the origin.
    pub async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot, Error> {
        let mut response = self.network.fetch(request).await?;
        response.stamp_origin(&self.origin);
        Ok(response)
    }

    /// Forward to the network; never read or write a store.
    pub async fn network_only(&self, request: &Request, route: Route) -> Result<FetchOutcome, Error> {
        let response = self.network.fetch(request).await?;
        Ok(FetchOutcome { response, source: ResponseSource::Network, route })
    }

    pub async fn cache_first(&self, request: &Request, route: Route, placement: &Placement) -> Result<FetchOutcome, Error> {
        let key = RequestKey::get(&request.url);
        if let Some(cached) = self.lookup(placement, &key).await {
            tracing::debug!("cache hit for {}", key);
            return Ok(FetchOutcome { response: cached, source: ResponseSource::Cache, route });
        }

        tracing::debug!("cache miss for {}, fetching", key);
        let response = self.fetch(request).await?;
        self.store(placement, &key, &response).await;
        Ok(FetchOutcome { response, source: ResponseSource::Network, route })
    }

    /// Serve the stored entry at once and refresh it in the background; on a
    /// miss, wait for the network.
    pub async fn stale_while_revalidate(
        &self, request: &Request, route: Route, placement: &Placement,
    ) -> Result<FetchOutcome, Error> {
        let key = RequestKey::get(&request.url);
        if let Some(cached) = self.lookup(placement, &key).await {
            tracing::debug!("cache hit for {}, revalidating in background", key);
            self.spawn_refresh(request.clone(), key, placement.clone());
            return Ok(FetchOutcome { response: cached, source: ResponseSource::Cache, route });
        }

        tracing::debug!("cache miss for {}, fetching", key);
        let response = self.fetch(request).await?;
        self.store(placement, &key, &response).await;
        Ok(FetchOutcome { response, source: ResponseSource::Network, route })
    }

    /// Wait for every background refresh spawned so far.
    pub async fn settle(&self) {
        let pending: Vec<JoinHandle<()>> = match self.refreshes.lock() {
            Ok(mut refreshes) => refreshes.drain(..).collect(),
            Err(_) => return,
        };
        for handle in pending {
            if let Err(e) = handle.await {
                tracing::warn!("background refresh panicked: {}", e);
            }
        }
    }

    /// Detached refresh; it keeps running when the caller goes away.
    fn spawn_refresh(&self, request: Request, key: RequestKey, placement: Placement) {
        let executor = self.clone();
        let handle = tokio::spawn(async move {
            match executor.fetch(&request).await {
                Ok(response) => executor.store(&placement, &key, &response).await,
                Err(e) => tracing::warn!("background refresh of {} failed: {}", key, e),
            }
        });

        if let Ok(mut refreshes) = self.refreshes.lock() {
            refreshes.retain(|pending| !pending.is_finished());
            refreshes.push(handle);
        }
    }

    /// First hit across the placement's read stores. Read errors count as misses.
    async fn lookup(&self, placement: &Placement, key: &RequestKey) -> Option<ResponseSnapshot> {
        for name in &placement.reads {
            match self.db.store(name).lookup(key).await {
                Ok(Some(hit)) => return Some(hit),
                Ok(None) => {}
                Err(e) => tracing::warn!(store = name.as_str(), "cache read for {} failed: {}", key, e),
            }
        }
        None
    }

    fn is_storable(placement: &Placement, response: &ResponseSnapshot) -> bool {
        response.is_success() && (!placement.same_origin_only || response.response_type == ResponseType::Basic)
    }

    /// Write an eligible response, then enforce the store's bound.
    async fn store(&self, placement: &Placement, key: &RequestKey, response: &ResponseSnapshot) {
        if !Self::is_storable(placement, response) {
            tracing::debug!(
                "not caching {} (status {}, type {})",
                key,
                response.status,
                response.response_type.as_str()
            );
            return;
        }

        let store = self.db.store(&placement.write);
        if let Err(e) = store.put(key, response).await {
            tracing::warn!(store = store.name(), "failed to cache {}: {}", key, e);
            return;
        }

        if let Some(max) = placement.max_entries {
            match store.trim(max).await {
                Ok(0) => {}
                Ok(evicted) => tracing::debug!(store = store.name(), evicted, "trimmed store"),
                Err(e) => tracing::warn!(store = store.name(), "failed to trim: {}", e),
            }
        }
    }
}
