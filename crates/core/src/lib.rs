//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Named, versioned cache stores with a SQLite backend
//! - Request keys and response snapshots
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, RequestKey, ResponseSnapshot, ResponseType, Store, StoreName};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
