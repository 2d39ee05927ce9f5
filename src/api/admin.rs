use crate::api::errors::ApiError;
use crate::api::run_query;
use crate::storage::schema;
use crate::AppState;
use axum::extract::{Query, State};
use axum::Json;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

/// Fixed HMAC key; both sides of the comparison are digested under it.
const REVALIDATE_CONTEXT: &[u8] = b"dock-data/revalidate";

/// Query parameters for the revalidate endpoint.
#[derive(Debug, Deserialize)]
pub struct RevalidateParams {
    pub tag: Option<String>,
    pub pass: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RevalidateResponse {
    pub revalidated: bool,
    /// Unix time in milliseconds.
    pub now: i64,
    pub removed: usize,
}

fn secret_digest(secret: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(REVALIDATE_CONTEXT).ok()?;
    mac.update(secret.as_bytes());
    Some(mac)
}

/// Constant-time comparison of a supplied pass with the configured one.
/// Both values are reduced to fixed-length digests first.
pub fn pass_matches(expected: &str, given: &str) -> bool {
    let (Some(expected), Some(given)) = (secret_digest(expected), secret_digest(given)) else {
        return false;
    };
    given
        .verify_slice(&expected.finalize().into_bytes())
        .is_ok()
}

/// GET /api/revalidate: drop cached results and re-read the Parquet exports.
///
/// With `tag`, only entries carrying that tag are dropped; otherwise the
/// whole cache is flushed.
pub async fn revalidate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RevalidateParams>,
) -> Result<Json<RevalidateResponse>, ApiError> {
    let authorized = match (state.revalidate_pass.as_deref(), params.pass.as_deref()) {
        (Some(expected), Some(given)) => pass_matches(expected, given),
        _ => false,
    };
    if !authorized {
        tracing::warn!("Rejected revalidation with invalid pass");
        return Err(ApiError::Unauthorized("Invalid pass".to_string()));
    }

    let data_dir = state.data_dir.clone();
    run_query(&state, move |conn| {
        Ok(schema::setup_query_views(conn, &data_dir)?)
    })
    .await?;

    let tag = params.tag.as_deref().filter(|t| !t.is_empty());
    let removed = match tag {
        Some(tag) => state.query_cache.invalidate_tag(tag),
        None => state.query_cache.clear(),
    };
    tracing::info!(tag = tag.unwrap_or("*"), removed, "Revalidated cached results");

    Ok(Json(RevalidateResponse {
        revalidated: true,
        now: chrono::Utc::now().timestamp_millis(),
        removed,
    }))
}
