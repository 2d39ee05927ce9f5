use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration loaded from environment variables or TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// DuckDB database file holding `stations` and `station_days`.
    /// If not set, an empty in-memory database is used.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// Directory scanned for Parquet exports from the ingestion pipeline.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Query cache TTL in seconds (default: 3600). 0 = no caching.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Shared secret for `/api/revalidate`. If not set, revalidation is refused.
    #[serde(default)]
    pub revalidate_pass: Option<String>,
    /// Dashboard origin for CORS restrictions on API routes.
    /// If not set, any origin may read the API.
    #[serde(default)]
    pub dashboard_origin: Option<String>,
    /// Graceful shutdown timeout in seconds (default: 30).
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

const fn default_cache_ttl_secs() -> u64 {
    3600
}

const fn default_shutdown_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: None,
            data_dir: default_data_dir(),
            cache_ttl_secs: default_cache_ttl_secs(),
            revalidate_pass: None,
            dashboard_origin: None,
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults.
    ///
    /// Environment variables override file values:
    /// - `DOCKDATA_HOST` → host
    /// - `DOCKDATA_PORT` → port
    /// - `DOCKDATA_DATABASE` → database_path
    /// - `DOCKDATA_DATA_DIR` → data_dir
    /// - `DOCKDATA_CACHE_TTL` → cache_ttl_secs
    /// - `DOCKDATA_PASS` → revalidate_pass
    /// - `DOCKDATA_DASHBOARD_ORIGIN` → dashboard_origin
    /// - `DOCKDATA_SHUTDOWN_TIMEOUT` → shutdown_timeout_secs
    pub fn load(config_path: Option<&Path>) -> Self {
        let mut config =
            config_path.map_or_else(Self::default, |path| match std::fs::read_to_string(path) {
                Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                    tracing::warn!("Failed to parse config file: {e}, using defaults");
                    Self::default()
                }),
                Err(e) => {
                    tracing::warn!("Failed to read config file: {e}, using defaults");
                    Self::default()
                }
            });

        if let Ok(host) = std::env::var("DOCKDATA_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("DOCKDATA_PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }
        if let Ok(path) = std::env::var("DOCKDATA_DATABASE") {
            config.database_path = Some(PathBuf::from(path));
        }
        if let Ok(data_dir) = std::env::var("DOCKDATA_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(val) = std::env::var("DOCKDATA_CACHE_TTL") {
            if let Ok(t) = val.parse() {
                config.cache_ttl_secs = t;
            }
        }
        if let Ok(pass) = std::env::var("DOCKDATA_PASS") {
            config.revalidate_pass = Some(pass);
        }
        if let Ok(origin) = std::env::var("DOCKDATA_DASHBOARD_ORIGIN") {
            config.dashboard_origin = Some(origin);
        }
        if let Ok(val) = std::env::var("DOCKDATA_SHUTDOWN_TIMEOUT") {
            if let Ok(t) = val.parse() {
                config.shutdown_timeout_secs = t;
            }
        }

        // An empty secret would let an empty `pass` through.
        if config.revalidate_pass.as_deref().is_some_and(str::is_empty) {
            config.revalidate_pass = None;
        }

        config
    }

    /// Returns the `host:port` listen address.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
