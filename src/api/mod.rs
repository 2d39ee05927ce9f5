pub mod admin;
pub mod catalog;
pub mod errors;
pub mod usage;

use crate::api::errors::ApiError;
use crate::AppState;
use duckdb::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Run `query` against the shared connection on a blocking thread.
pub(crate) async fn run_query<T, F>(state: &Arc<AppState>, query: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, ApiError> + Send + 'static,
{
    state.queries_total.fetch_add(1, Ordering::Relaxed);
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || {
        let conn = state.conn.lock();
        query(&*conn)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Query task panicked: {e}")))?
}

/// Serve `key` from the result cache, or run `query` and cache its result
/// under `tags`. Errors are never cached, and neither is a result that an
/// invalidation overtook while it was being computed.
pub(crate) async fn cached_query<T, F>(
    state: &Arc<AppState>,
    key: String,
    tags: &[&str],
    query: F,
) -> Result<T, ApiError>
where
    T: Serialize + DeserializeOwned + Send + 'static,
    F: FnOnce(&Connection) -> Result<T, ApiError> + Send + 'static,
{
    if let Some(cached) = state.query_cache.get(&key) {
        if let Ok(val) = serde_json::from_str(&cached) {
            state.cache_hits_total.fetch_add(1, Ordering::Relaxed);
            return Ok(val);
        }
        tracing::warn!(key = %key, "Ignoring unreadable cache entry");
    }

    let generation = state.query_cache.generation();
    let result = run_query(state, query).await?;

    if let Ok(serialized) = serde_json::to_string(&result) {
        state.query_cache.insert_since(generation, key, serialized, tags);
    }
    Ok(result)
}
