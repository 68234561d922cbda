//! The offline worker: lifecycle triggers wired to routing, strategies and
//! the cache store.

pub mod clients;
pub mod config;
pub mod lifecycle;
pub mod message;
pub mod route;
pub mod strategy;

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};
use url::Url;

use crate::fetch::{Network, Request};
use shellcache_core::cache::RequestKey;
use shellcache_core::{CacheDb, Error, StoreName};

pub use clients::Clients;
pub use config::{Placement, StorePlan, WorkerConfig};
pub use lifecycle::{LifecycleState, WorkerState};
pub use message::{ClientMessage, WorkerMessage};
pub use route::{AssetClass, Route, RouteTable};
pub use strategy::{Executor, FetchOutcome, ResponseSource, Strategy};

/// A manifest entry that could not be precached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedAsset {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReport {
    pub version: String,
    pub store: String,
    pub cached: Vec<String>,
    pub failed: Vec<FailedAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateReport {
    pub version: String,
    /// Stale stores removed during cleanup.
    pub deleted: Vec<String>,
    /// Number of open pages now controlled by this version.
    pub claimed: usize,
}

/// Lifecycle triggers delivered by the host.
#[async_trait]
pub trait ServiceWorker: Send + Sync {
    async fn on_install(&self) -> Result<InstallReport, Error>;
    async fn on_activate(&self) -> Result<ActivateReport, Error>;
    async fn on_fetch(&self, request: Request) -> Result<FetchOutcome, Error>;
    async fn on_message(&self, message: WorkerMessage) -> Result<Option<ClientMessage>, Error>;
}

/// Request-intercepting cache worker for one deployed version.
pub struct OfflineWorker {
    config: WorkerConfig,
    db: CacheDb,
    executor: Executor,
    state: RwLock<WorkerState>,
    clients: Clients,
}

impl OfflineWorker {
    pub fn new(config: WorkerConfig, db: CacheDb, network: Arc<dyn Network>) -> Self {
        let executor = Executor::new(db.clone(), network, config.origin().clone());
        Self { config, db, executor, state: RwLock::new(WorkerState::default()), clients: Clients::new() }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub async fn skip_waiting_requested(&self) -> bool {
        self.state.read().await.skip_waiting
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientMessage> {
        self.clients.subscribe()
    }

    /// Wait for outstanding background refreshes.
    pub async fn settle(&self) {
        self.executor.settle().await;
    }

    /// Boot sequence: install, then activate at once when skip-waiting was
    /// requested.
    pub async fn start(&self) -> Result<(InstallReport, Option<ActivateReport>), Error> {
        let installed = self.on_install().await?;
        let activated = self.activate_if_waiting().await?;
        Ok((installed, activated))
    }

    /// Activate an installed worker whose skip-waiting flag is set.
    ///
    /// Returns `None` when there is nothing to do, including when a
    /// concurrent caller has already taken the worker past `Installed`.
    pub async fn activate_if_waiting(&self) -> Result<Option<ActivateReport>, Error> {
        let state = self.state().await;
        if !state.skip_waiting || state.lifecycle != LifecycleState::Installed {
            return Ok(None);
        }
        match self.on_activate().await {
            Ok(report) => Ok(Some(report)),
            Err(Error::InvalidState { actual, .. }) => {
                tracing::debug!("activation already taken by another caller (state {})", actual);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Register page `id` as open. Once activated, this version controls it
    /// at once; before that it waits for the activation claim.
    ///
    /// Returns the page's controller after registration.
    pub async fn register_client(&self, id: &str) -> Option<String> {
        self.clients.register(id).await;
        if self.state.read().await.lifecycle.can_intercept_fetch() {
            self.clients.control(id, &self.config.version).await;
        }
        self.clients.controller_of(id).await
    }

    /// Store names owned by this worker's prefix, sorted.
    pub async fn owned_store_names(&self) -> Result<Vec<String>, Error> {
        let names = self.db.store_names().await?;
        Ok(names.into_iter().filter(|name| StoreName::is_owned_by(&self.config.prefix, name)).collect())
    }

    async fn advance(&self, to: LifecycleState) -> Result<(), Error> {
        let mut state = self.state.write().await;
        state.lifecycle = state.lifecycle.advance(to)?;
        tracing::info!(version = self.config.version.as_str(), "worker {}", state.lifecycle);
        Ok(())
    }

    async fn precache(&self, store: &str, url: &Url) -> Result<(), String> {
        let response = self.executor.fetch(&Request::get(url.clone())).await.map_err(|e| e.to_string())?;
        if !response.is_success() {
            return Err(format!("HTTP {}", response.status));
        }
        self.db
            .store(store)
            .put(&RequestKey::get(url), &response)
            .await
            .map_err(|e| e.to_string())
    }

    async fn delete_stores(&self, names: &[&str]) -> Vec<String> {
        let mut deleted = Vec::new();
        for name in names {
            match self.db.delete_store(name).await {
                Ok(true) => {
                    tracing::info!(store = *name, "deleted store");
                    deleted.push(name.to_string());
                }
                Ok(false) => {}
                Err(e) => tracing::warn!(store = *name, "failed to delete store: {}", e),
            }
        }
        deleted
    }
}

#[async_trait]
impl ServiceWorker for OfflineWorker {
    async fn on_install(&self) -> Result<InstallReport, Error> {
        self.advance(LifecycleState::Installing).await?;

        let shell = self.config.stores.shell.to_string();
        if let Err(e) = self.db.open_store(&shell).await {
            tracing::warn!(store = shell.as_str(), "failed to open store: {}", e);
        }

        let results = join_all(self.config.manifest.iter().map(|url| self.precache(&shell, url))).await;

        let mut cached = Vec::new();
        let mut failed = Vec::new();
        for (url, result) in self.config.manifest.iter().zip(results) {
            match result {
                Ok(()) => cached.push(url.to_string()),
                Err(reason) => {
                    tracing::warn!(url = url.as_str(), "failed to precache: {}", reason);
                    failed.push(FailedAsset { url: url.to_string(), reason });
                }
            }
        }

        self.advance(LifecycleState::Installed).await?;
        self.state.write().await.skip_waiting = true;

        Ok(InstallReport { version: self.config.version.clone(), store: shell, cached, failed })
    }

    async fn on_activate(&self) -> Result<ActivateReport, Error> {
        self.advance(LifecycleState::Activating).await?;

        let deleted = match self.db.store_names().await {
            Ok(names) => {
                let stale = StoreName::stale_names(&self.config.prefix, &self.config.version, &names);
                self.delete_stores(&stale).await
            }
            Err(e) => {
                tracing::warn!("failed to list stores during cleanup: {}", e);
                Vec::new()
            }
        };

        let claimed = self.clients.claim(&self.config.version).await;
        self.advance(LifecycleState::Activated).await?;

        Ok(ActivateReport { version: self.config.version.clone(), deleted, claimed })
    }

    async fn on_fetch(&self, request: Request) -> Result<FetchOutcome, Error> {
        if !self.state.read().await.lifecycle.can_intercept_fetch() {
            return self.executor.network_only(&request, Route::Bypass).await;
        }

        let route = self.config.routes.classify(&request);
        let class = match route {
            Route::Bypass => return self.executor.network_only(&request, route).await,
            Route::Intercept(class) => class,
        };

        let key = RequestKey::get(&request.url);
        let placement = self.config.placement(class, &key);
        match (Strategy::for_class(class), placement) {
            (Strategy::CacheFirst, Some(placement)) => self.executor.cache_first(&request, route, &placement).await,
            (Strategy::StaleWhileRevalidate, Some(placement)) => {
                self.executor.stale_while_revalidate(&request, route, &placement).await
            }
            _ => self.executor.network_only(&request, route).await,
        }
    }

    async fn on_message(&self, message: WorkerMessage) -> Result<Option<ClientMessage>, Error> {
        match message {
            WorkerMessage::SkipWaiting => {
                self.state.write().await.skip_waiting = true;
                tracing::info!("skip waiting requested");
                Ok(None)
            }
            WorkerMessage::ClearCaches => {
                let owned = self.owned_store_names().await?;
                let names: Vec<&str> = owned.iter().map(String::as_str).collect();
                let deleted = self.delete_stores(&names).await;

                let ack = ClientMessage::CachesClearedAck { version: self.config.version.clone(), deleted };
                let receivers = self.clients.broadcast(ack.clone());
                tracing::info!(receivers, "caches cleared");
                Ok(Some(ack))
            }
        }
    }
}
