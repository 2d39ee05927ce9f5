use dock_data::config::Config;
use dock_data::{server, storage, AppState};
use duckdb::Connection;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    init_tracing();

    // Load configuration
    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref().map(std::path::Path::new));

    tracing::info!(
        host = %config.host,
        port = config.port,
        data_dir = %config.data_dir.display(),
        cache_ttl_secs = config.cache_ttl_secs,
        "Starting Dock Data"
    );
    if config.revalidate_pass.is_none() {
        tracing::warn!("No revalidation pass set; /api/revalidate will refuse every request");
    }

    // Open DuckDB
    let conn = match &config.database_path {
        Some(path) => Connection::open(path).expect("Failed to open DuckDB database"),
        None => {
            tracing::warn!("No database_path set, serving an empty in-memory store");
            Connection::open_in_memory().expect("Failed to open DuckDB")
        }
    };
    storage::migrations::run_migrations(&conn).expect("Failed to run migrations");
    storage::schema::setup_query_views(&conn, &config.data_dir)
        .expect("Failed to create query views");

    let state = Arc::new(AppState::new(conn, &config));

    // Evict expired cache entries
    if config.cache_ttl_secs > 0 {
        let cleanup_state = Arc::clone(&state);
        let period = Duration::from_secs(config.cache_ttl_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                cleanup_state.query_cache.cleanup_expired();
            }
        });
    }

    let app = server::build_router(state);
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!(addr = %addr, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Duration::from_secs(
            config.shutdown_timeout_secs,
        )))
        .await
        .expect("Server error");
    tracing::info!("Shutdown complete");
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dock_data=info,tower_http=info".into());

    if std::env::var("DOCKDATA_LOG_FORMAT").is_ok_and(|v| v == "json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Resolves on Ctrl-C or SIGTERM, then arms a hard deadline for draining.
async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!(timeout_secs = timeout.as_secs(), "Shutdown signal received, draining connections");
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        tracing::warn!("Graceful shutdown timed out, exiting");
        std::process::exit(1);
    });
}
