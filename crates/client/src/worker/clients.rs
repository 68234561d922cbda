//! Pages known to the worker and the broadcast channel to them.
//!
//! The host registers pages as they open (the MCP surface does so for
//! each `worker_fetch` that names a `client_id`).

use std::collections::HashMap;

use tokio::sync::{RwLock, broadcast};

use super::message::ClientMessage;

const CHANNEL_CAPACITY: usize = 16;

/// Registered pages and their controlling worker version.
pub struct Clients {
    controllers: RwLock<HashMap<String, Option<String>>>,
    tx: broadcast::Sender<ClientMessage>,
}

impl Default for Clients {
    fn default() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { controllers: RwLock::new(HashMap::new()), tx }
    }
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an open page. It is uncontrolled until claimed.
    pub async fn register(&self, id: &str) {
        self.controllers.write().await.entry(id.to_string()).or_insert(None);
    }

    pub async fn unregister(&self, id: &str) -> bool {
        self.controllers.write().await.remove(id).is_some()
    }

    /// Make `version` the controller of every registered page.
    ///
    /// Returns the number of pages claimed.
    pub async fn claim(&self, version: &str) -> usize {
        let mut controllers = self.controllers.write().await;
        for controller in controllers.values_mut() {
            *controller = Some(version.to_string());
        }
        controllers.len()
    }

    /// Make `version` the controller of one registered page.
    ///
    /// Returns false when the page is not registered.
    pub async fn control(&self, id: &str, version: &str) -> bool {
        match self.controllers.write().await.get_mut(id) {
            Some(controller) => {
                *controller = Some(version.to_string());
                true
            }
            None => false,
        }
    }

    /// Version controlling page `id`, if any.
    pub async fn controller_of(&self, id: &str) -> Option<String> {
        self.controllers.read().await.get(id).cloned().flatten()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientMessage> {
        self.tx.subscribe()
    }

    /// Send `message` to every subscriber. Returns how many received it.
    pub fn broadcast(&self, message: ClientMessage) -> usize {
        self.tx.send(message).unwrap_or(0)
    }
}
