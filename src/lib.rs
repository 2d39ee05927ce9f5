//! Dock Data: bike-share dock usage over a DuckDB station-day store.
//!
//! Resolves a selection (station, borough, community or council district)
//! into timeframes, chart series, topline summaries and freshness flags, and
//! serves them as JSON.

pub mod api;
pub mod config;
pub mod query;
pub mod server;
pub mod storage;

use crate::config::Config;
use crate::query::cache::QueryCache;
use duckdb::Connection;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub conn: Arc<Mutex<Connection>>,
    /// Where Parquet exports are looked up when views are refreshed.
    pub data_dir: PathBuf,
    pub query_cache: QueryCache,
    pub revalidate_pass: Option<String>,
    pub dashboard_origin: Option<String>,
    pub queries_total: AtomicU64,
    pub cache_hits_total: AtomicU64,
}

impl AppState {
    pub fn new(conn: Connection, config: &Config) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            data_dir: config.data_dir.clone(),
            query_cache: QueryCache::new(config.cache_ttl_secs),
            revalidate_pass: config.revalidate_pass.clone(),
            dashboard_origin: config.dashboard_origin.clone(),
            queries_total: AtomicU64::new(0),
            cache_hits_total: AtomicU64::new(0),
        }
    }
}
