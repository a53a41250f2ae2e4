//! API Handlers
//!
//! HTTP request handlers for each admin endpoint. The cache never fails a
//! request on its own storage errors; those are absorbed and logged.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::cache::{CacheService, SetOptions};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    CountResponse, DeleteResponse, GetResponse, HealthResponse, SetRequest, SetResponse,
    StatsResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache; synchronizes internally
    pub cache: Arc<CacheService>,
}

impl AppState {
    pub fn new(cache: CacheService) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Opens the persistent store named by the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(CacheService::init(config)?))
    }
}

/// Runs a cache operation on the blocking pool.
///
/// Cache calls may hit SQLite while holding the cache lock, so they stay off
/// the async workers.
async fn run_blocking<T, F>(cache: &Arc<CacheService>, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&CacheService) -> T + Send + 'static,
{
    let cache = Arc::clone(cache);
    tokio::task::spawn_blocking(move || op(&cache))
        .await
        .map_err(|e| CacheError::Internal(format!("Cache task failed: {}", e)))
}

/// Handler for PUT /entries
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.unwrap_or_else(|| state.cache.default_ttl()).max(1);
    let SetRequest { key, value, .. } = req;
    let key = run_blocking(&state.cache, move |cache| {
        cache.set(&key, &value, SetOptions::ttl(ttl));
        key
    })
    .await?;

    Ok(Json(SetResponse::new(key, ttl)))
}

/// Handler for GET /entries/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let lookup = key.clone();
    let value = run_blocking(&state.cache, move |cache| cache.get::<Value>(&lookup))
        .await?
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /entries/:key
///
/// Deleting an absent key succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let key = run_blocking(&state.cache, move |cache| {
        cache.delete(&key);
        key
    })
    .await?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for DELETE /entries
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<CountResponse>> {
    let removed = run_blocking(&state.cache, |cache| {
        let removed = cache.get_stats().keys.len();
        cache.clear_all();
        removed
    })
    .await?;

    Ok(Json(CountResponse::new("Cache cleared", removed)))
}

/// Handler for DELETE /prefix/:prefix
pub async fn delete_prefix_handler(
    State(state): State<AppState>,
    Path(prefix): Path<String>,
) -> Result<Json<CountResponse>> {
    if prefix.is_empty() {
        return Err(CacheError::InvalidRequest(
            "Prefix cannot be empty".to_string(),
        ));
    }

    let message = format!("Deleted keys with prefix '{}'", prefix);
    let removed = run_blocking(&state.cache, move |cache| cache.delete_by_prefix(&prefix)).await?;

    Ok(Json(CountResponse::new(message, removed)))
}

/// Handler for DELETE /users/:user_id
pub async fn invalidate_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<CountResponse>> {
    let message = format!("Invalidated cache for user '{}'", user_id);
    let removed =
        run_blocking(&state.cache, move |cache| cache.invalidate_user_cache(&user_id)).await?;

    Ok(Json(CountResponse::new(message, removed)))
}

/// Handler for POST /prune
pub async fn prune_handler(State(state): State<AppState>) -> Result<Json<CountResponse>> {
    let removed = run_blocking(&state.cache, |cache| cache.prune_expired()).await?;
    Ok(Json(CountResponse::new("Expired entries pruned", removed)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let stats = run_blocking(&state.cache, |cache| cache.get_stats()).await?;
    Ok(Json(stats.into()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use serde_json::json;

    fn test_state() -> AppState {
        AppState::new(CacheService::new(100, 300, MemoryStore::new()))
    }

    fn set_request(key: &str, value: Value) -> SetRequest {
        SetRequest {
            key: key.to_string(),
            value,
            ttl: None,
        }
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let result = set_handler(
            State(state.clone()),
            Json(set_request("food:1", json!({"kcal": 50}))),
        )
        .await;
        assert_eq!(result.unwrap().ttl, 300);

        let response = get_handler(State(state), Path("food:1".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, json!({"kcal": 50}));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let result = get_handler(State(test_state()), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler_is_idempotent() {
        let state = test_state();
        set_handler(State(state.clone()), Json(set_request("k", json!(1))))
            .await
            .unwrap();

        delete_handler(State(state.clone()), Path("k".to_string()))
            .await
            .unwrap();
        let again = delete_handler(State(state.clone()), Path("k".to_string()))
            .await
            .unwrap();
        assert_eq!(again.key, "k");

        let result = get_handler(State(state), Path("k".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_prefix_and_user_handlers() {
        let state = test_state();
        for key in ["user:42:profile", "user:42:goals", "user:43:profile"] {
            set_handler(State(state.clone()), Json(set_request(key, json!(1))))
                .await
                .unwrap();
        }

        let removed = delete_prefix_handler(State(state.clone()), Path("user:42:".to_string()))
            .await
            .unwrap();
        assert_eq!(removed.removed, 2);

        let removed = invalidate_user_handler(State(state.clone()), Path("43".to_string()))
            .await
            .unwrap();
        assert_eq!(removed.removed, 1);
        assert!(state.cache.get_stats().keys.is_empty());
    }

    #[tokio::test]
    async fn test_empty_prefix_rejected() {
        let result = delete_prefix_handler(State(test_state()), Path(String::new())).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_clear_and_prune_handlers() {
        let state = test_state();
        set_handler(State(state.clone()), Json(set_request("a", json!(1))))
            .await
            .unwrap();

        let pruned = prune_handler(State(state.clone())).await.unwrap();
        assert_eq!(pruned.removed, 0);

        let cleared = clear_handler(State(state.clone())).await.unwrap();
        assert_eq!(cleared.removed, 1);
        assert_eq!(state.cache.get_stats().disk_size, 0);
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let response = stats_handler(State(test_state())).await.unwrap();
        assert_eq!(response.stats.hits, 0);
        assert_eq!(response.stats.misses, 0);
        assert_eq!(response.hit_rate, 0.0);
    }

    #[tokio::test]
    async fn test_handlers_run_on_blocking_pool() {
        let state = test_state();
        let cache = Arc::clone(&state.cache);

        // Current-thread runtime: anything run inline would share this thread
        let worker = std::thread::current().id();
        let ran_on = run_blocking(&state.cache, |_| std::thread::current().id())
            .await
            .unwrap();
        assert_ne!(ran_on, worker);

        let key = run_blocking(&cache, |cache| {
            cache.set("food:2", &json!(2), SetOptions::default());
            "food:2".to_string()
        })
        .await
        .unwrap();
        assert_eq!(cache.get::<Value>(&key), Some(json!(2)));
    }

    #[tokio::test]
    async fn test_panicking_cache_task_is_internal_error() {
        let state = test_state();

        let result: Result<()> = run_blocking(&state.cache, |_| panic!("boom")).await;
        assert!(matches!(result, Err(CacheError::Internal(_))));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let result = set_handler(State(test_state()), Json(set_request("", json!(1)))).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }
}
