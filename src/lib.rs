//! Sealed Cache - A bounded, encrypted, file-backed key-value cache
//!
//! Values are serialized, compressed and encrypted (AES-GCM or an
//! XSalsa20-Poly1305 secret-box) before being written to one file per key.
//! Entries expire lazily by TTL and the oldest insertions are evicted once the
//! configured capacity is exceeded.

pub mod api;
pub mod cache;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheEngine, EngineSettings, FileCacheStore};
pub use config::Config;
pub use crypto::CryptoProvider;
pub use error::{CacheError, Result};
pub use tasks::spawn_purge_task;
