use crate::api::{admin, catalog, usage};
use crate::AppState;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api_cors = build_api_cors(state.dashboard_origin.as_deref());

    let api_routes = Router::new()
        .route("/timeframe", get(usage::get_timeframe))
        .route("/topline", get(usage::get_topline))
        .route("/chart", get(usage::get_chart))
        .route("/summary", get(usage::get_summary))
        .route("/mostrecentdate", get(usage::get_most_recent_date))
        .route("/stations", get(catalog::get_stations))
        .route("/community-districts", get(catalog::get_community_districts))
        .route("/council-districts", get(catalog::get_council_districts))
        .route("/revalidate", get(admin::revalidate))
        .layer(api_cors);

    Router::new()
        .route("/health", get(health_check))
        .route("/health/detailed", get(detailed_health_check))
        .route("/metrics", get(prometheus_metrics))
        .nest("/api", api_routes)
        .layer(axum::middleware::map_response(add_security_headers))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Inject security headers on every HTTP response.
async fn add_security_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    response
}

/// Build the CORS layer for API routes based on the configured origin.
fn build_api_cors(dashboard_origin: Option<&str>) -> CorsLayer {
    dashboard_origin.map_or_else(
        || {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET])
                .allow_headers(Any)
        },
        |origin| {
            let allowed_origin = origin.parse::<HeaderValue>().unwrap_or_else(|_| {
                tracing::warn!(origin, "Invalid dashboard origin, allowing any origin");
                HeaderValue::from_static("*")
            });
            CorsLayer::new()
                .allow_origin(allowed_origin)
                .allow_methods([Method::GET])
                .allow_headers([header::CONTENT_TYPE])
        },
    )
}

/// GET /health: liveness probe.
async fn health_check() -> &'static str {
    "ok"
}

/// GET /health/detailed: store and cache status.
async fn detailed_health_check(State(state): State<Arc<AppState>>) -> axum::Json<serde_json::Value> {
    let state2 = Arc::clone(&state);
    let database_ok = tokio::task::spawn_blocking(move || {
        let conn = state2.conn.lock();
        conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0))
            .is_ok()
    })
    .await
    .unwrap_or(false);

    axum::Json(serde_json::json!({
        "status": if database_ok { "ok" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "database_ok": database_ok,
        "revalidate_configured": state.revalidate_pass.is_some(),
        "cache_entries": state.query_cache.len(),
        "cache_empty": state.query_cache.is_empty(),
    }))
}

/// GET /metrics: Prometheus text exposition.
async fn prometheus_metrics(
    State(state): State<Arc<AppState>>,
) -> ([(header::HeaderName, &'static str); 1], String) {
    use std::fmt::Write;

    let cache_entries = state.query_cache.len();
    let queries = state.queries_total.load(Ordering::Relaxed);
    let cache_hits = state.cache_hits_total.load(Ordering::Relaxed);
    let revalidate_configured = u8::from(state.revalidate_pass.is_some());

    let mut out = String::with_capacity(512);
    let _ = writeln!(
        out,
        "# HELP dockdata_cache_entries Number of cached query results"
    );
    let _ = writeln!(out, "# TYPE dockdata_cache_entries gauge");
    let _ = writeln!(out, "dockdata_cache_entries {cache_entries}");
    let _ = writeln!(
        out,
        "# HELP dockdata_queries_total Store queries executed since startup"
    );
    let _ = writeln!(out, "# TYPE dockdata_queries_total counter");
    let _ = writeln!(out, "dockdata_queries_total {queries}");
    let _ = writeln!(
        out,
        "# HELP dockdata_cache_hits_total Requests answered from the result cache"
    );
    let _ = writeln!(out, "# TYPE dockdata_cache_hits_total counter");
    let _ = writeln!(out, "dockdata_cache_hits_total {cache_hits}");
    let _ = writeln!(
        out,
        "# HELP dockdata_revalidate_configured Whether a revalidation pass is set"
    );
    let _ = writeln!(out, "# TYPE dockdata_revalidate_configured gauge");
    let _ = writeln!(out, "dockdata_revalidate_configured {revalidate_configured}");

    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], out)
}
