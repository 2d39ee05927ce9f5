//! Usage endpoints for a selection (`type` + `specifier`).
//!
//! A malformed selection, `daily` flag or date is a 400. A well-formed
//! selection with no rows is a 404 on `/api/timeframe` and `/api/summary`;
//! topline and chart answer it with zeros and an empty series.

use crate::api::errors::ApiError;
use crate::api::cached_query;
use crate::query::freshness::is_stale;
use crate::query::selector::FilterPredicate;
use crate::query::series::{self, ChartPoint, Granularity};
use crate::query::timeframe::{self, MonthStamp, Timeframe};
use crate::query::topline::{self, ToplineData, UsageRates};
use crate::AppState;
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Query parameters naming a selection.
#[derive(Debug, Deserialize)]
pub struct SelectionParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub specifier: Option<String>,
}

impl SelectionParams {
    pub fn predicate(&self) -> Result<FilterPredicate, ApiError> {
        Ok(FilterPredicate::from_params(
            self.kind.as_deref(),
            self.specifier.as_deref(),
        )?)
    }
}

/// Query parameters for the chart endpoint.
#[derive(Debug, Deserialize)]
pub struct ChartParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub specifier: Option<String>,
    pub daily: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl ChartParams {
    /// Validate in the order: granularity, dates, selection.
    fn resolve(&self) -> Result<(FilterPredicate, Granularity, NaiveDate, NaiveDate), ApiError> {
        let daily = match self.daily.as_deref() {
            Some("true") => true,
            Some("false") => false,
            _ => return Err(ApiError::BadRequest("Specify daily parameter".to_string())),
        };
        let granularity = Granularity::from_daily_flag(daily);

        let (Some(start), Some(end)) = (
            self.start.as_deref().and_then(parse_query_date),
            self.end.as_deref().and_then(parse_query_date),
        ) else {
            return Err(ApiError::BadRequest("Invalid date or dates".to_string()));
        };

        let predicate =
            FilterPredicate::from_params(self.kind.as_deref(), self.specifier.as_deref())?;
        Ok((predicate, granularity, start, end))
    }
}

/// Parse `YYYY-MM-DD`, or an RFC 3339 timestamp taken as its UTC date.
pub fn parse_query_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

/// Everything the dashboard header needs for one selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSummary {
    pub timeframe: Timeframe,
    pub topline: ToplineData,
    pub rates: UsageRates,
    pub stale: bool,
}

/// GET /api/timeframe: First and last day with data.
pub async fn get_timeframe(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
) -> Result<Json<Timeframe>, ApiError> {
    let predicate = params.predicate()?;
    let tag = predicate.tag();
    let cache_key = format!("timeframe:{tag}");

    let result = cached_query(&state, cache_key, &["timeframe", tag.as_str()], move |conn| {
        Ok(timeframe::query_timeframe(conn, &predicate)?)
    })
    .await?;
    Ok(Json(result))
}

/// GET /api/topline: All-time trip totals.
pub async fn get_topline(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
) -> Result<Json<ToplineData>, ApiError> {
    let predicate = params.predicate()?;
    let tag = predicate.tag();
    let cache_key = format!("topline:{tag}");

    let result = cached_query(&state, cache_key, &["topline", tag.as_str()], move |conn| {
        Ok(topline::query_topline(conn, &predicate)?)
    })
    .await?;
    Ok(Json(result))
}

/// GET /api/chart: Bucketed arrive/depart counts.
pub async fn get_chart(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChartParams>,
) -> Result<Json<Vec<ChartPoint>>, ApiError> {
    let (predicate, granularity, start, end) = params.resolve()?;
    let tag = predicate.tag();
    let cache_key = format!("chart:{tag}:{}:{start}:{end}", granularity.as_str());

    let result = cached_query(&state, cache_key, &["chart", tag.as_str()], move |conn| {
        Ok(series::query_series(conn, &predicate, start, end, granularity)?)
    })
    .await?;
    Ok(Json(result))
}

/// GET /api/mostrecentdate: Latest month present anywhere in the store.
pub async fn get_most_recent_date(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MonthStamp>, ApiError> {
    let result = cached_query(
        &state,
        "mostrecentdate".to_string(),
        &["mostrecentdate"],
        |conn| Ok(timeframe::query_most_recent(conn)?),
    )
    .await?;
    Ok(Json(result))
}

/// GET /api/summary: Timeframe, topline, derived rates and staleness in one read.
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
) -> Result<Json<SelectionSummary>, ApiError> {
    let predicate = params.predicate()?;
    let tag = predicate.tag();
    let cache_key = format!("summary:{tag}");

    // `stale` also depends on the store-wide most recent month.
    let tags = ["summary", "mostrecentdate", tag.as_str()];
    let result = cached_query(&state, cache_key, &tags, move |conn| {
        let timeframe = timeframe::query_timeframe(conn, &predicate)?;
        let topline = topline::query_topline(conn, &predicate)?;
        let most_recent = timeframe::query_most_recent(conn)?;
        Ok(SelectionSummary {
            rates: UsageRates::derive(&topline, &timeframe),
            stale: is_stale(&timeframe, most_recent),
            timeframe,
            topline,
        })
    })
    .await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart_params(daily: Option<&str>, start: Option<&str>, end: Option<&str>) -> ChartParams {
        ChartParams {
            kind: Some("station".to_string()),
            specifier: Some("7".to_string()),
            daily: daily.map(str::to_string),
            start: start.map(str::to_string),
            end: end.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_plain_date() {
        assert_eq!(
            parse_query_date("2023-06-01"),
            NaiveDate::from_ymd_opt(2023, 6, 1)
        );
    }

    #[test]
    fn test_parse_rfc3339_uses_utc_date() {
        assert_eq!(
            parse_query_date("2023-06-01T23:30:00-04:00"),
            NaiveDate::from_ymd_opt(2023, 6, 2)
        );
        assert_eq!(
            parse_query_date("2023-06-01T00:00:00.000Z"),
            NaiveDate::from_ymd_opt(2023, 6, 1)
        );
    }

    #[test]
    fn test_parse_garbage_date() {
        assert_eq!(parse_query_date("yesterday"), None);
        assert_eq!(parse_query_date("2023-13-01"), None);
        assert_eq!(parse_query_date(""), None);
    }

    #[test]
    fn test_chart_params_resolve() {
        let (predicate, granularity, start, end) =
            chart_params(Some("false"), Some("2023-01-01"), Some("2023-03-31"))
                .resolve()
                .unwrap();
        assert_eq!(predicate, FilterPredicate::Station(7));
        assert_eq!(granularity, Granularity::Monthly);
        assert!(start < end);
    }

    #[test]
    fn test_chart_params_daily_must_be_exact() {
        for daily in [None, Some("TRUE"), Some("1"), Some("")] {
            let err = chart_params(daily, Some("2023-01-01"), Some("2023-01-02"))
                .resolve()
                .unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(msg) if msg == "Specify daily parameter"));
        }
    }

    #[test]
    fn test_chart_params_bad_dates() {
        let err = chart_params(Some("true"), Some("nope"), Some("2023-01-02"))
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg == "Invalid date or dates"));

        let err = chart_params(Some("true"), Some("2023-01-01"), None)
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_chart_params_bad_selection() {
        let mut params = chart_params(Some("true"), Some("2023-01-01"), Some("2023-01-02"));
        params.kind = Some("neighborhood".to_string());
        assert!(matches!(params.resolve(), Err(ApiError::BadRequest(_))));
    }
}
