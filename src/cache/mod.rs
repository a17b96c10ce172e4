//! Cache Module
//!
//! Provides a file-backed, encrypted cache with TTL expiration and FIFO eviction.

pub mod clock;
pub mod codec;
mod engine;
mod entry;
pub mod key;
mod queue;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{Compressor, GzipCompressor, IdentityCompressor};
pub use engine::{CacheEngine, EngineSettings};
pub use entry::{CacheEntry, EnvelopeError};
pub use queue::EvictionQueue;
pub use stats::CacheStats;
pub use store::{CacheStore, FileCacheStore, CACHE_EXTENSION};

// == Public Constants ==
pub use key::MAX_STORAGE_KEY_LENGTH;
