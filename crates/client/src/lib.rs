//! Client code for shellcache.
//!
//! This crate provides the network layer and the offline worker (routing,
//! caching strategies and lifecycle) shared by the server and tests.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, Network, Request};
pub use worker::{
    ActivateReport, AssetClass, ClientMessage, FetchOutcome, InstallReport, OfflineWorker, ResponseSource, Route,
    ServiceWorker, WorkerConfig, WorkerMessage,
};
