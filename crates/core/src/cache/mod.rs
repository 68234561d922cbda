//! SQLite-backed named cache stores.
//!
//! This module provides persistent request → response stores using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Multiple named stores whose names carry a `(role, version)` pair
//! - Content-addressed entry keys using SHA-256 hashing
//! - Insertion-ordered trimming to a maximum entry count
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entry;
pub mod hash;
pub mod migrations;
pub mod naming;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use entry::{RequestKey, ResponseSnapshot, ResponseType};
pub use naming::StoreName;
pub use store::Store;
