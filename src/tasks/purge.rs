//! Expired Entry Purge Task
//!
//! Background task that periodically deletes expired entry files. Reads
//! already expire lazily; this keeps entries nobody reads from piling up on disk.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::{CacheEngine, CacheStore};
use crate::error::CacheError;

/// Spawns a background task that periodically purges expired cache entries.
///
/// The task sleeps for `interval_secs` between runs and holds the write lock
/// only while a purge is in progress. The purge itself scans and deletes files,
/// so it runs on the blocking pool. A failed purge is logged and retried on the
/// next tick.
///
/// # Example
/// ```ignore
/// let state = AppState::from_config(&config)?;
/// let purge_handle = spawn_purge_task(state.cache.clone(), 60);
/// // Later, during shutdown:
/// purge_handle.abort();
/// ```
pub fn spawn_purge_task<S>(
    cache: Arc<RwLock<CacheEngine<S>>>,
    interval_secs: u64,
) -> JoinHandle<()>
where
    S: CacheStore + 'static,
{
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expired entry purge task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let mut engine = Arc::clone(&cache).write_owned().await;
            let result = tokio::task::spawn_blocking(move || engine.purge_expired())
                .await
                .unwrap_or_else(|e| Err(CacheError::from(e)));

            match result {
                Ok(0) => debug!("Purge: no expired entries found"),
                Ok(removed) => info!("Purge: removed {} expired entries", removed),
                Err(e) => error!(error = %e, "Purge failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{EngineSettings, FileCacheStore, ManualClock};
    use crate::crypto::test_keys::sodium_settings;
    use crate::crypto::CryptoProvider;
    use tempfile::TempDir;

    fn shared_engine() -> (TempDir, ManualClock, Arc<RwLock<CacheEngine>>) {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::new(1_000);
        let engine = CacheEngine::new(
            FileCacheStore::open(dir.path()).unwrap(),
            CryptoProvider::from_settings(&sodium_settings()).unwrap(),
            EngineSettings {
                capacity: 100,
                default_ttl: 300,
            },
        )
        .unwrap()
        .with_clock(clock.clone());
        (dir, clock, Arc::new(RwLock::new(engine)))
    }

    #[tokio::test]
    async fn test_purge_task_removes_expired_entries() {
        let (dir, clock, cache) = shared_engine();

        cache.write().await.set("expire_soon", "value", Some(1)).unwrap();
        cache.write().await.set("long_lived", "value", Some(3600)).unwrap();
        clock.advance(5);

        let handle = spawn_purge_task(cache.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        handle.abort();

        assert!(!dir.path().join("expire_soon.cache").exists());
        assert!(dir.path().join("long_lived.cache").exists());
        assert_eq!(cache.read().await.stats().expirations, 1);
    }

    #[tokio::test]
    async fn test_purge_task_can_be_aborted() {
        let (_dir, _clock, cache) = shared_engine();

        let handle = spawn_purge_task(cache, 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
