//! Scripted network for tests.
//!
//! Routes are keyed by absolute URL. Every call is recorded before the
//! reply is produced, so a test can observe a request that is still held.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;

use super::{Network, Request};
use shellcache_core::{Error, ResponseSnapshot};

#[derive(Clone)]
enum Reply {
    Respond(ResponseSnapshot),
    Fail(String),
}

/// In-memory `Network` with canned replies.
#[derive(Default)]
pub struct MockNetwork {
    routes: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
    holds: Mutex<HashMap<String, watch::Sender<bool>>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` for `url`, replacing any previous route.
    pub fn respond(&self, url: &str, response: ResponseSnapshot) {
        self.lock_routes().insert(url.to_string(), Reply::Respond(response));
    }

    /// Serve a text body with the given status for `url`.
    pub fn respond_text(&self, url: &str, status: u16, body: &str) {
        self.respond(url, ResponseSnapshot::new(url, status, body.as_bytes().to_vec()));
    }

    /// Fail every request to `url` with a network error.
    pub fn fail(&self, url: &str, message: &str) {
        self.lock_routes().insert(url.to_string(), Reply::Fail(message.to_string()));
    }

    /// Hold requests to `url` until `release` is called.
    pub fn hold(&self, url: &str) {
        let (tx, _rx) = watch::channel(false);
        self.lock_holds().insert(url.to_string(), tx);
    }

    pub fn release(&self, url: &str) {
        if let Some(tx) = self.lock_holds().remove(url) {
            let _ = tx.send(true);
        }
    }

    /// All recorded calls as `METHOD url`, in arrival order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Number of calls made to `url`, any method.
    pub fn calls_to(&self, url: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.split_once(' ').is_some_and(|(_, called)| called == url))
            .count()
    }

    fn lock_routes(&self) -> std::sync::MutexGuard<'_, HashMap<String, Reply>> {
        self.routes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_holds(&self) -> std::sync::MutexGuard<'_, HashMap<String, watch::Sender<bool>>> {
        self.holds.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot, Error> {
        let url = request.url.as_str().to_string();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(format!("{} {}", request.method, url));
        }

        let held = self.lock_holds().get(&url).map(|tx| tx.subscribe());
        if let Some(mut rx) = held {
            let _ = rx.wait_for(|released| *released).await;
        }

        let reply = self.lock_routes().get(&url).cloned();
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(Error::Network(message)),
            None => Err(Error::Network(format!("no route for {url}"))),
        }
    }
}
