//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint. Engine calls do
//! blocking file and cipher work, so they run on tokio's blocking pool while
//! the handler holds the write lock.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::cache::CacheEngine;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HealthResponse, KeysResponse, SetRequest,
    SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Engine behind a lock; every engine operation may touch disk and the queue
    pub cache: Arc<RwLock<CacheEngine>>,
}

impl AppState {
    pub fn new(cache: CacheEngine) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    /// Builds the file-backed engine described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(CacheEngine::from_config(config)?))
    }

    /// Runs `op` against the engine on the blocking pool under the write lock.
    pub async fn run_blocking<F, R>(&self, op: F) -> Result<R>
    where
        F: FnOnce(&mut CacheEngine) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let mut cache = Arc::clone(&self.cache).write_owned().await;
        tokio::task::spawn_blocking(move || op(&mut *cache)).await?
    }
}

/// Handler for PUT /set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let SetRequest { key, value, ttl } = req;
    let key = state
        .run_blocking(move |cache| {
            cache.set(&key, &value, ttl)?;
            Ok(key)
        })
        .await?;

    Ok(Json(SetResponse::new(key)))
}

/// Handler for GET /get/:key
///
/// Misses and expired entries are both 404.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    // Write lock: an expired read deletes the entry
    let lookup = key.clone();
    let value = state
        .run_blocking(move |cache| cache.get::<Value>(&lookup))
        .await?;

    match value {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
///
/// Always succeeds for absent keys.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let target = key.clone();
    state.run_blocking(move |cache| cache.delete(&target)).await?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    let removed = state.run_blocking(|cache| cache.clear()).await?;

    Ok(Json(ClearResponse::new(removed)))
}

/// Handler for GET /keys
pub async fn keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    let cache = state.cache.read().await;
    Json(KeysResponse { keys: cache.keys() })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    Json(StatsResponse::new(&cache.stats(), cache.capacity()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
