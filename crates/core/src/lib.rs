//! Core types and shared functionality for funnies.
//!
//! This crate provides:
//! - The comic data model and its wire format
//! - Cache store abstraction with SQLite and in-memory backends
//! - Freshness policy and the cache synchronization engine
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod freshness;
pub mod model;
pub mod provider;
pub mod sync;

pub use cache::{CacheDb, CacheStore, MemoryStore};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use freshness::FreshnessPolicy;
pub use model::{Comic, ComicData, ComicSnapshot, Media, MediaKind};
pub use provider::ComicProvider;
pub use sync::{SyncEngine, SyncOutcome, SyncReport};
