use crate::api::cached_query;
use crate::api::errors::ApiError;
use crate::query::catalog::{self, District, DistrictKind, StationsByBorough};
use crate::AppState;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

/// GET /api/stations: every station, grouped by borough.
pub async fn get_stations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StationsByBorough>, ApiError> {
    let result = cached_query(&state, "stations".to_string(), &["stations"], |conn| {
        Ok(catalog::list_stations(conn)?)
    })
    .await?;
    Ok(Json(result))
}

/// GET /api/community-districts
pub async fn get_community_districts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<District>>, ApiError> {
    districts(&state, DistrictKind::Community).await
}

/// GET /api/council-districts
pub async fn get_council_districts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<District>>, ApiError> {
    districts(&state, DistrictKind::Council).await
}

async fn districts(
    state: &Arc<AppState>,
    kind: DistrictKind,
) -> Result<Json<Vec<District>>, ApiError> {
    let tag = kind.cache_tag();
    let result = cached_query(state, tag.to_string(), &[tag], move |conn| {
        Ok(match kind {
            DistrictKind::Community => catalog::list_community_districts(conn)?,
            DistrictKind::Council => catalog::list_council_districts(conn)?,
        })
    })
    .await?;
    Ok(Json(result))
}
