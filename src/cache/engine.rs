//! Cache Engine Module
//!
//! Combines a persistence backend, a crypto provider and a FIFO eviction queue
//! into a bounded, encrypted key-value cache with lazy TTL expiry.
//!
//! Write path: serialize → compress → encrypt → envelope → save → enqueue → evict.
//! Read path: load → expiry check → decrypt → decompress → deserialize.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::codec::{self, Compressor, GzipCompressor};
use crate::cache::{
    key, CacheEntry, CacheStats, CacheStore, EnvelopeError, EvictionQueue, FileCacheStore,
};
use crate::config::Config;
use crate::crypto::CryptoProvider;
use crate::error::{CacheError, Result};

// == Engine Settings ==
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// Maximum number of keys before FIFO eviction
    pub capacity: usize,
    /// TTL in seconds used when `set` gets none
    pub default_ttl: u64,
}

// == Cache Engine ==
/// Encrypted cache over a [`CacheStore`].
///
/// Not internally synchronized; share it behind a lock.
pub struct CacheEngine<S: CacheStore = FileCacheStore> {
    store: S,
    crypto: CryptoProvider,
    compressor: Box<dyn Compressor>,
    clock: Box<dyn Clock>,
    queue: EvictionQueue,
    stats: CacheStats,
    default_ttl: u64,
}

impl<S: CacheStore> fmt::Debug for CacheEngine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEngine")
            .field("crypto", &self.crypto)
            .field("queue", &self.queue)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl CacheEngine<FileCacheStore> {
    /// Builds a file-backed engine from configuration.
    ///
    /// Fails on unusable encryption settings or an uncreatable cache directory.
    pub fn from_config(config: &Config) -> Result<Self> {
        let crypto = CryptoProvider::from_settings(&config.encryption)?;
        let dir = &config.cache.dir;
        let store = FileCacheStore::open(dir)
            .map_err(|e| CacheError::io("opening cache directory", dir.display().to_string(), e))?;

        Self::new(
            store,
            crypto,
            EngineSettings {
                capacity: config.cache.capacity,
                default_ttl: config.cache.default_ttl,
            },
        )
    }
}

impl<S: CacheStore> CacheEngine<S> {
    // == Constructor ==
    /// Creates an engine with gzip compression and the system clock.
    ///
    /// The eviction queue is rebuilt from entries already in `store`, oldest
    /// first, and anything beyond capacity is evicted immediately. A capacity
    /// of zero is a configuration error.
    pub fn new(store: S, crypto: CryptoProvider, settings: EngineSettings) -> Result<Self> {
        if settings.capacity == 0 {
            return Err(CacheError::Configuration(
                "CACHE.MEMCACHED must be at least 1".to_string(),
            ));
        }

        let mut engine = Self {
            store,
            crypto,
            compressor: Box::new(GzipCompressor::default()),
            clock: Box::new(SystemClock),
            queue: EvictionQueue::new(settings.capacity),
            stats: CacheStats::new(),
            default_ttl: settings.default_ttl,
        };

        let existing = engine
            .store
            .keys_by_age()
            .map_err(|e| CacheError::io("scanning", "*", e))?;
        for storage_key in &existing {
            engine.queue.push(storage_key);
        }

        let evicted = engine.evict_overflow()?;
        if evicted > 0 {
            warn!(
                "Evicted {} stored entries exceeding capacity {} at startup",
                evicted,
                engine.queue.capacity()
            );
        }
        engine.stats.set_total_entries(engine.queue.len());

        info!(
            entries = engine.queue.len(),
            capacity = engine.queue.capacity(),
            provider = ?engine.crypto.encryption_type(),
            "cache engine ready"
        );
        Ok(engine)
    }

    /// Replaces the compression codec.
    pub fn with_compressor(mut self, compressor: impl Compressor + 'static) -> Self {
        self.compressor = Box::new(compressor);
        self
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl` seconds (default TTL when `None`).
    ///
    /// Setting an existing key replaces it and moves it to the newest queue
    /// position. Once stored, the oldest keys are evicted until the queue is
    /// back within capacity.
    pub fn set<T>(&mut self, key: &str, value: &T, ttl: Option<u64>) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let storage_key = key::sanitize(key)?;

        let serialized =
            codec::encode_value(value).map_err(|e| CacheError::codec("serializing", key, e))?;
        let compressed = self
            .compressor
            .compress(&serialized)
            .map_err(|e| CacheError::codec("compressing", key, e))?;
        let mut entry = CacheEntry::new(
            storage_key.clone(),
            self.clock.now(),
            ttl.unwrap_or(self.default_ttl),
            Vec::new(),
        );
        entry.data = self
            .crypto
            .encrypt(&entry.bind_payload(&compressed))
            .map_err(|_| CacheError::Encryption { key: key.to_string() })?;
        let envelope = entry
            .to_bytes()
            .map_err(|e| CacheError::codec("encoding envelope for", key, e))?;

        self.store
            .save(&storage_key, &envelope)
            .map_err(|e| CacheError::io("writing", key, e))?;
        self.queue.push(&storage_key);
        debug!(key, ttl = entry.ttl, bytes = envelope.len(), "cache set");

        self.evict_overflow()?;
        self.stats.set_total_entries(self.queue.len());
        Ok(())
    }

    // == Get ==
    /// Returns the value under `key`, or `None` when absent or expired.
    ///
    /// An expired entry is deleted as a side effect. Corrupted or tampered
    /// entries are errors, never misses.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>> {
        let storage_key = key::sanitize(key)?;

        let compressed = match self.open_live(key, &storage_key)? {
            Some(compressed) => compressed,
            None => {
                self.stats.record_miss();
                return Ok(None);
            }
        };

        let serialized = self
            .compressor
            .decompress(&compressed)
            .map_err(|e| CacheError::codec("decompressing", key, e))?;
        let value =
            codec::decode_value(&serialized).map_err(|e| CacheError::codec("deserializing", key, e))?;

        self.stats.record_hit();
        Ok(Some(value))
    }

    // == Contains ==
    /// Whether `key` holds a live, authentic entry. Removes the entry if it
    /// has expired. Does not decompress or deserialize the value.
    pub fn contains(&mut self, key: &str) -> Result<bool> {
        let storage_key = key::sanitize(key)?;
        Ok(self.open_live(key, &storage_key)?.is_some())
    }

    // == Delete ==
    /// Removes `key`. Deleting an absent key succeeds.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        let storage_key = key::sanitize(key)?;
        self.remove_storage_key(key, &storage_key)?;
        debug!(key, "cache delete");
        Ok(())
    }

    // == Clear ==
    /// Removes every entry in the store and empties the eviction queue.
    pub fn clear(&mut self) -> Result<usize> {
        let removed = self
            .store
            .clear_all()
            .map_err(|e| CacheError::io("clearing", "*", e))?;
        self.queue.clear();
        self.stats.set_total_entries(0);
        info!("Cache cleared: removed {} entries", removed);
        Ok(removed)
    }

    // == Purge Expired ==
    /// Removes every expired entry in the store. Returns how many were removed.
    ///
    /// Entries whose envelope cannot be parsed are left for `get` to report.
    pub fn purge_expired(&mut self) -> Result<usize> {
        let now = self.clock.now();
        let storage_keys = self
            .store
            .keys_by_age()
            .map_err(|e| CacheError::io("scanning", "*", e))?;

        let mut removed = 0;
        for storage_key in storage_keys {
            let bytes = match self.store.load(&storage_key) {
                Ok(Some(bytes)) => bytes,
                Ok(None) => continue,
                Err(e) => return Err(CacheError::io("reading", storage_key, e)),
            };
            let entry = match CacheEntry::from_bytes(storage_key.as_str(), &bytes) {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(key = %storage_key, error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.is_expired_at(now) {
                self.remove_storage_key(&storage_key, &storage_key)?;
                self.stats.record_expiration();
                removed += 1;
            }
        }

        self.stats.set_total_entries(self.queue.len());
        Ok(removed)
    }

    // == Keys ==
    /// Tracked keys from oldest to newest insertion, in their original form.
    pub fn keys(&self) -> Vec<String> {
        self.queue.iter().filter_map(|k| key::restore(k)).collect()
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.queue.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // == Internals ==
    /// Loads and parses the envelope, deleting it if expired.
    fn load_live(&mut self, key: &str, storage_key: &str) -> Result<Option<CacheEntry>> {
        let bytes = match self
            .store
            .load(storage_key)
            .map_err(|e| CacheError::io("reading", key, e))?
        {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        let entry = CacheEntry::from_bytes(storage_key, &bytes).map_err(|e| match e {
            EnvelopeError::Base64(_) => decryption_error(key, e),
            EnvelopeError::Json(_) => CacheError::codec("parsing envelope for", key, e),
        })?;

        if entry.is_expired_at(self.clock.now()) {
            self.remove_storage_key(key, storage_key)?;
            self.stats.record_expiration();
            debug!(key, "cache entry expired");
            return Ok(None);
        }

        Ok(Some(entry))
    }

    /// Decrypts a live entry and checks its sealed header against the
    /// envelope. Returns the compressed payload.
    fn open_live(&mut self, key: &str, storage_key: &str) -> Result<Option<Vec<u8>>> {
        let entry = match self.load_live(key, storage_key)? {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let plaintext = self.crypto.decrypt(&entry.data).map_err(|e| {
            warn!(key, error = %e, "cache entry failed authentication");
            decryption_error(key, e)
        })?;

        match entry.verify_payload(&plaintext) {
            Some(payload) => Ok(Some(payload.to_vec())),
            None => {
                warn!(key, "sealed header does not match envelope");
                Err(decryption_error(key, "sealed header does not match envelope"))
            }
        }
    }

    fn remove_storage_key(&mut self, key: &str, storage_key: &str) -> Result<bool> {
        let removed = self
            .store
            .remove(storage_key)
            .map_err(|e| CacheError::io("deleting", key, e))?;
        self.queue.remove(storage_key);
        self.stats.set_total_entries(self.queue.len());
        Ok(removed)
    }

    /// Deletes the oldest entries until the queue is within capacity.
    ///
    /// A victim leaves the queue only once its file is gone; on failure it
    /// stays tracked and the next write retries it.
    fn evict_overflow(&mut self) -> Result<usize> {
        let mut evicted = 0;
        while let Some(victim) = self.queue.overflow_victim().map(str::to_string) {
            if let Err(e) = self.store.remove(&victim) {
                warn!(key = %victim, error = %e, "eviction failed, entry stays queued");
                return Err(CacheError::io("evicting", victim, e));
            }
            self.queue.remove(&victim);
            self.stats.record_eviction();
            debug!(key = %victim, "cache evict");
            evicted += 1;
        }
        Ok(evicted)
    }
}

fn decryption_error(key: &str, reason: impl fmt::Display) -> CacheError {
    CacheError::Decryption {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::cache::codec::IdentityCompressor;
    use crate::crypto::test_keys::{openssl_settings, sodium_settings};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::io;
    use std::sync::Mutex;

    /// In-memory store with a write counter standing in for mtimes.
    #[derive(Default)]
    struct MemoryStore {
        files: Mutex<HashMap<String, (u64, Vec<u8>)>>,
        writes: Mutex<u64>,
    }

    impl CacheStore for MemoryStore {
        fn save(&self, key: &str, envelope: &[u8]) -> io::Result<()> {
            let mut writes = self.writes.lock().unwrap();
            *writes += 1;
            self.files
                .lock()
                .unwrap()
                .insert(key.to_string(), (*writes, envelope.to_vec()));
            Ok(())
        }

        fn load(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
            Ok(self.files.lock().unwrap().get(key).map(|(_, b)| b.clone()))
        }

        fn remove(&self, key: &str) -> io::Result<bool> {
            Ok(self.files.lock().unwrap().remove(key).is_some())
        }

        fn clear_all(&self) -> io::Result<usize> {
            let mut files = self.files.lock().unwrap();
            let count = files.len();
            files.clear();
            Ok(count)
        }

        fn keys_by_age(&self) -> io::Result<Vec<String>> {
            let files = self.files.lock().unwrap();
            let mut keys: Vec<(u64, String)> =
                files.iter().map(|(k, (seq, _))| (*seq, k.clone())).collect();
            keys.sort();
            Ok(keys.into_iter().map(|(_, k)| k).collect())
        }
    }

    /// Memory store whose next `remove` calls fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing_removes: Mutex<usize>,
    }

    impl CacheStore for FlakyStore {
        fn save(&self, key: &str, envelope: &[u8]) -> io::Result<()> {
            self.inner.save(key, envelope)
        }

        fn load(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
            self.inner.load(key)
        }

        fn remove(&self, key: &str) -> io::Result<bool> {
            let mut failing = self.failing_removes.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(io::Error::new(io::ErrorKind::Other, "busy"));
            }
            self.inner.remove(key)
        }

        fn clear_all(&self) -> io::Result<usize> {
            self.inner.clear_all()
        }

        fn keys_by_age(&self) -> io::Result<Vec<String>> {
            self.inner.keys_by_age()
        }
    }

    fn engine(capacity: usize) -> (CacheEngine<MemoryStore>, ManualClock) {
        let clock = ManualClock::new(1_700_000_000);
        let crypto = CryptoProvider::from_settings(&sodium_settings()).unwrap();
        let engine = CacheEngine::new(
            MemoryStore::default(),
            crypto,
            EngineSettings {
                capacity,
                default_ttl: 300,
            },
        )
        .unwrap()
        .with_clock(clock.clone());
        (engine, clock)
    }

    #[test]
    fn test_set_and_get() {
        let (mut engine, _) = engine(10);

        engine.set("key1", "value1", None).unwrap();
        let value: Option<String> = engine.get("key1").unwrap();

        assert_eq!(value.as_deref(), Some("value1"));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_get_missing_is_none() {
        let (mut engine, _) = engine(10);
        let value: Option<Value> = engine.get("nonexistent").unwrap();
        assert!(value.is_none());
        assert_eq!(engine.stats().misses, 1);
    }

    #[test]
    fn test_stored_bytes_are_not_plaintext() {
        let (mut engine, _) = engine(10);
        engine.set("secret", "correct horse battery staple", None).unwrap();

        let raw = engine.store().load("secret").unwrap().unwrap();
        let text = String::from_utf8_lossy(&raw);
        assert!(!text.contains("correct horse"));
    }

    #[test]
    fn test_default_ttl_applied() {
        let (mut engine, clock) = engine(10);
        engine.set("k", &1, None).unwrap();

        clock.advance(300);
        assert_eq!(engine.get::<i32>("k").unwrap(), Some(1));
        clock.advance(1);
        assert_eq!(engine.get::<i32>("k").unwrap(), None);
    }

    #[test]
    fn test_user_profile_scenario() {
        let (mut engine, clock) = engine(10);
        engine.set("user:1", &json!({"name": "Ada"}), Some(60)).unwrap();

        clock.advance(10);
        assert_eq!(engine.get::<Value>("user:1").unwrap(), Some(json!({"name": "Ada"})));

        clock.advance(51);
        assert_eq!(engine.get::<Value>("user:1").unwrap(), None);
        assert!(engine.store().load("user%3A1").unwrap().is_none());
        assert_eq!(engine.stats().expirations, 1);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_overwrite_refreshes_ttl_and_position() {
        let (mut engine, clock) = engine(2);

        engine.set("a", "1", Some(10)).unwrap();
        engine.set("b", "2", None).unwrap();
        clock.advance(8);
        engine.set("a", "3", Some(10)).unwrap();

        // "b" is now the oldest insertion.
        engine.set("c", "4", None).unwrap();
        assert_eq!(engine.get::<String>("b").unwrap(), None);

        clock.advance(8);
        assert_eq!(engine.get::<String>("a").unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn test_fifo_eviction_ignores_reads() {
        let (mut engine, _) = engine(3);

        engine.set("key1", "value1", None).unwrap();
        engine.set("key2", "value2", None).unwrap();
        engine.set("key3", "value3", None).unwrap();

        // Reading key1 does not protect it under FIFO.
        let _: Option<String> = engine.get("key1").unwrap();
        engine.set("key4", "value4", None).unwrap();

        assert_eq!(engine.len(), 3);
        assert_eq!(engine.get::<String>("key1").unwrap(), None);
        assert!(engine.get::<String>("key2").unwrap().is_some());
        assert_eq!(engine.stats().evictions, 1);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (mut engine, _) = engine(10);

        engine.set("k", "v", None).unwrap();
        engine.delete("k").unwrap();
        engine.delete("k").unwrap();
        engine.delete("never-set").unwrap();

        assert!(engine.get::<String>("k").unwrap().is_none());
        assert!(engine.is_empty());
    }

    #[test]
    fn test_clear_empties_store_and_queue() {
        let (mut engine, _) = engine(10);

        engine.set("a", "1", None).unwrap();
        engine.set("b", "2", None).unwrap();

        assert_eq!(engine.clear().unwrap(), 2);
        assert!(engine.is_empty());
        assert!(engine.get::<String>("a").unwrap().is_none());
        assert!(engine.get::<String>("b").unwrap().is_none());
    }

    #[test]
    fn test_contains_honours_expiry() {
        let (mut engine, clock) = engine(10);
        engine.set("k", "v", Some(5)).unwrap();

        assert!(engine.contains("k").unwrap());
        clock.advance(6);
        assert!(!engine.contains("k").unwrap());
        assert!(engine.store().load("k").unwrap().is_none());
    }

    #[test]
    fn test_purge_expired_removes_only_expired() {
        let (mut engine, clock) = engine(10);

        engine.set("short", "1", Some(1)).unwrap();
        engine.set("long", "2", Some(100)).unwrap();
        clock.advance(2);

        assert_eq!(engine.purge_expired().unwrap(), 1);
        assert_eq!(engine.keys(), vec!["long"]);
        assert_eq!(engine.get::<String>("long").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_tampered_entry_is_decryption_error() {
        let (mut engine, _) = engine(10);
        engine.set("k", "v", None).unwrap();

        let raw = engine.store().load("k").unwrap().unwrap();
        let mut entry = CacheEntry::from_bytes("k", &raw).unwrap();
        entry.data[30] ^= 0x80;
        engine.store().save("k", &entry.to_bytes().unwrap()).unwrap();

        let err = engine.get::<String>("k").unwrap_err();
        assert!(matches!(err, CacheError::Decryption { ref key, .. } if key == "k"));
    }

    #[test]
    fn test_envelope_moved_to_another_key_is_decryption_error() {
        let (mut engine, _) = engine(10);
        engine.set("a", "from a", None).unwrap();
        engine.set("b", "from b", None).unwrap();

        let raw = engine.store().load("a").unwrap().unwrap();
        engine.store().save("b", &raw).unwrap();

        assert!(matches!(
            engine.get::<String>("b"),
            Err(CacheError::Decryption { ref key, .. }) if key == "b"
        ));
        assert_eq!(engine.get::<String>("a").unwrap().as_deref(), Some("from a"));
    }

    #[test]
    fn test_contains_rejects_edited_timestamp() {
        let (mut engine, clock) = engine(10);
        engine.set("k", "v", Some(10)).unwrap();

        let raw = engine.store().load("k").unwrap().unwrap();
        let mut entry = CacheEntry::from_bytes("k", &raw).unwrap();
        entry.timestamp += 1_000;
        engine.store().save("k", &entry.to_bytes().unwrap()).unwrap();
        clock.advance(100);

        assert!(matches!(
            engine.contains("k"),
            Err(CacheError::Decryption { .. })
        ));
    }

    #[test]
    fn test_garbled_envelope_is_codec_error() {
        let (mut engine, _) = engine(10);
        engine.store().save("k", b"{not json").unwrap();

        let err = engine.get::<String>("k").unwrap_err();
        assert!(matches!(err, CacheError::Codec { .. }));
    }

    #[test]
    fn test_wrong_key_cannot_read_entries() {
        let store = MemoryStore::default();
        let settings = EngineSettings {
            capacity: 10,
            default_ttl: 60,
        };

        let aes = CryptoProvider::from_settings(&openssl_settings("aes-256-gcm", 32)).unwrap();
        let mut writer = CacheEngine::new(store, aes, settings).unwrap();
        writer.set("k", "v", None).unwrap();

        let sodium = CryptoProvider::from_settings(&sodium_settings()).unwrap();
        let store = std::mem::take(&mut writer.store);
        let mut reader = CacheEngine::new(store, sodium, settings).unwrap();

        assert!(matches!(
            reader.get::<String>("k"),
            Err(CacheError::Decryption { .. })
        ));
    }

    #[test]
    fn test_identity_compressor_roundtrip() {
        let (engine, _) = engine(10);
        let mut engine = engine.with_compressor(IdentityCompressor);

        engine.set("k", &vec![1, 2, 3], None).unwrap();
        assert_eq!(engine.get::<Vec<i32>>("k").unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_queue_rebuilt_and_trimmed_on_startup() {
        let store = MemoryStore::default();
        for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
            let entry = CacheEntry::new(*key, 0, 60, vec![i as u8; 40]);
            store.save(key, &entry.to_bytes().unwrap()).unwrap();
        }

        let crypto = CryptoProvider::from_settings(&sodium_settings()).unwrap();
        let engine = CacheEngine::new(
            store,
            crypto,
            EngineSettings {
                capacity: 2,
                default_ttl: 60,
            },
        )
        .unwrap();

        assert_eq!(engine.keys(), vec!["c", "d"]);
        assert_eq!(engine.stats().evictions, 2);
        assert!(engine.store().load("a").unwrap().is_none());
    }

    #[test]
    fn test_failed_eviction_keeps_victim_queued() {
        let crypto = CryptoProvider::from_settings(&sodium_settings()).unwrap();
        let mut engine = CacheEngine::new(
            FlakyStore::default(),
            crypto,
            EngineSettings {
                capacity: 1,
                default_ttl: 60,
            },
        )
        .unwrap();

        engine.set("a", "1", None).unwrap();
        *engine.store().failing_removes.lock().unwrap() = 1;

        let err = engine.set("b", "2", None).unwrap_err();
        assert!(matches!(err, CacheError::Io { op: "evicting", .. }));
        assert_eq!(engine.keys(), vec!["a", "b"]);

        // The next write retries the victim left behind.
        engine.set("c", "3", None).unwrap();
        assert_eq!(engine.keys(), vec!["c"]);
        assert_eq!(engine.store().keys_by_age().unwrap(), vec!["c"]);
        assert_eq!(engine.get::<String>("a").unwrap(), None);
        assert_eq!(engine.stats().evictions, 2);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let crypto = CryptoProvider::from_settings(&sodium_settings()).unwrap();
        let result = CacheEngine::new(
            MemoryStore::default(),
            crypto,
            EngineSettings {
                capacity: 0,
                default_ttl: 60,
            },
        );
        assert!(matches!(result, Err(CacheError::Configuration(_))));
    }

    #[test]
    fn test_invalid_key_rejected_before_storage() {
        let (mut engine, _) = engine(10);
        assert!(matches!(
            engine.set("", "v", None),
            Err(CacheError::InvalidKey { .. })
        ));
        assert!(engine.is_empty());
    }
}
