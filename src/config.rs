//! Configuration Module
//!
//! Handles loading cache, encryption and server settings from environment variables.
//! Dotted configuration keys map to environment variables with `_`
//! (`CACHE.MEMCACHED` is read from `CACHE_MEMCACHED`).

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

/// Default cache directory when `CACHE_FILE` is unset
pub const DEFAULT_CACHE_DIR: &str = "storage/cache";

/// Default eviction capacity when `CACHE_MEMCACHED` is unset
pub const DEFAULT_CAPACITY: usize = 100;

/// Default TTL in seconds for entries stored without one
pub const DEFAULT_TTL: u64 = 300;

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage and eviction settings
    pub cache: CacheSettings,
    /// Encryption backend and key material
    pub encryption: EncryptionSettings,
    /// HTTP server port
    pub server_port: u16,
    /// Interval in seconds between expired-entry purges
    pub cleanup_interval: u64,
}

/// Settings under `CACHE.*`.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Directory holding one `.cache` file per key
    pub dir: PathBuf,
    /// Maximum number of keys kept before FIFO eviction
    pub capacity: usize,
    /// TTL applied when `set` is called without one
    pub default_ttl: u64,
}

/// Settings under `ENCRYPTION.*`.
///
/// Key material stays base64 here; it is decoded once when the crypto
/// provider is built.
#[derive(Clone)]
pub struct EncryptionSettings {
    /// `openssl` or `sodium`
    pub kind: String,
    /// Cipher name used by the openssl backend
    pub cipher: String,
    /// Base64 key for the openssl backend
    pub key: Option<String>,
    /// Base64 key for the sodium backend
    pub sodium_key: Option<String>,
}

impl fmt::Debug for EncryptionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionSettings")
            .field("kind", &self.kind)
            .field("cipher", &self.cipher)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("sodium_key", &self.sodium_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_FILE` - Cache directory (default: `storage/cache`)
    /// - `CACHE_MEMCACHED` - Eviction capacity (default: 100)
    /// - `CACHE_TTL` - Default TTL in seconds (default: 300)
    /// - `ENCRYPTION_TYPE` - `openssl` or `sodium` (default: `openssl`)
    /// - `ENCRYPTION_CIPHER` - Cipher name (default: `aes-256-gcm`)
    /// - `ENCRYPTION_KEY` - Base64 key for openssl
    /// - `ENCRYPTION_SODIUM` - Base64 key for sodium
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Purge frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            cache: CacheSettings {
                dir: non_empty("CACHE_FILE")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.cache.dir),
                capacity: parse_or(&lookup, "CACHE_MEMCACHED", defaults.cache.capacity),
                default_ttl: parse_or(&lookup, "CACHE_TTL", defaults.cache.default_ttl),
            },
            encryption: EncryptionSettings {
                kind: non_empty("ENCRYPTION_TYPE").unwrap_or(defaults.encryption.kind),
                cipher: non_empty("ENCRYPTION_CIPHER").unwrap_or(defaults.encryption.cipher),
                key: non_empty("ENCRYPTION_KEY"),
                sodium_key: non_empty("ENCRYPTION_SODIUM"),
            },
            server_port: parse_or(&lookup, "SERVER_PORT", defaults.server_port),
            cleanup_interval: parse_or(&lookup, "CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + fmt::Display,
{
    match lookup(name) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Invalid value '{}' for {}, using default {}", raw, name, default);
                default
            }
        },
        None => default,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheSettings {
                dir: PathBuf::from(DEFAULT_CACHE_DIR),
                capacity: DEFAULT_CAPACITY,
                default_ttl: DEFAULT_TTL,
            },
            encryption: EncryptionSettings {
                kind: "openssl".to_string(),
                cipher: "aes-256-gcm".to_string(),
                key: None,
                sodium_key: None,
            },
            server_port: 3000,
            cleanup_interval: 60,
        }
    }
}
