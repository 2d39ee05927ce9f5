use crate::query::selector::FilterPredicate;
use crate::query::timeframe::{MonthStamp, Timeframe};
use crate::query::{calendar_date, QueryError};
use chrono::{Datelike, NaiveDate};
use duckdb::{Connection, OptionalExt};
use serde::{Deserialize, Serialize};

/// All-time trip counts by bike type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripTotals {
    pub acoustic: u64,
    pub electric: u64,
}

impl TripTotals {
    pub const fn total(self) -> u64 {
        self.acoustic + self.electric
    }
}

/// Headline usage summary for a selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToplineData {
    pub trips: TripTotals,
    /// Trips of either type in months on or after the first e-bike trip's month.
    pub trips_since_first_electric: u64,
    #[serde(default)]
    pub first_electric_date: Option<NaiveDate>,
}

/// Rates shown next to the topline. Divisors are clamped to 1 so a
/// single-day or single-month timeframe never divides by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRates {
    pub total_trips: u64,
    pub per_month: u64,
    pub per_day: u64,
    pub ebike_percent: u64,
}

impl UsageRates {
    pub fn derive(topline: &ToplineData, timeframe: &Timeframe) -> Self {
        let total_trips = topline.trips.total();
        let months = calendar_months_between(timeframe.first_date, timeframe.last_date);
        let days = calendar_days_between(timeframe.first_date, timeframe.last_date);

        let ebike_percent = if topline.trips_since_first_electric == 0 {
            0
        } else {
            rounded_ratio(
                topline.trips.electric * 100,
                topline.trips_since_first_electric,
            )
        };

        Self {
            total_trips,
            per_month: rounded_ratio(total_trips, months),
            per_day: rounded_ratio(total_trips, days),
            ebike_percent,
        }
    }
}

fn calendar_months_between(first: NaiveDate, last: NaiveDate) -> u64 {
    let months = (i64::from(last.year()) - i64::from(first.year())) * 12
        + (i64::from(last.month()) - i64::from(first.month()));
    u64::try_from(months).unwrap_or(0).max(1)
}

fn calendar_days_between(first: NaiveDate, last: NaiveDate) -> u64 {
    u64::try_from((last - first).num_days()).unwrap_or(0).max(1)
}

/// `numerator / denominator`, rounded half up. `denominator` must be non-zero.
const fn rounded_ratio(numerator: u64, denominator: u64) -> u64 {
    (numerator + denominator / 2) / denominator
}

/// Summarize all-time usage for a selection.
///
/// A selection with no rows yields an all-zero summary, not an error.
pub fn query_topline(
    conn: &Connection,
    predicate: &FilterPredicate,
) -> Result<ToplineData, QueryError> {
    let trips = query_trip_totals(conn, predicate, None)?;
    let first_electric_date = query_first_electric_date(conn, predicate)?;

    // Bounded by month only, not by day.
    let trips_since_first_electric = match first_electric_date {
        Some(date) => query_trip_totals(conn, predicate, Some(MonthStamp::of(date)))?.total(),
        None => 0,
    };

    Ok(ToplineData {
        trips,
        trips_since_first_electric,
        first_electric_date,
    })
}

/// Sum acoustic and electric trips, optionally only from a month onward.
pub fn query_trip_totals(
    conn: &Connection,
    predicate: &FilterPredicate,
    from_month: Option<MonthStamp>,
) -> Result<TripTotals, duckdb::Error> {
    let mut sql = format!(
        "SELECT CAST(COALESCE(SUM(acoustic_arrive + acoustic_depart), 0) AS BIGINT),
                CAST(COALESCE(SUM(electric_arrive + electric_depart), 0) AS BIGINT)
         FROM station_days_all
         WHERE {}",
        predicate.sql_condition()
    );
    if from_month.is_some() {
        sql.push_str(" AND year * 100 + month >= ?");
    }

    let mut stmt = conn.prepare(&sql)?;
    let bind = predicate.bind_value();
    let map_row = |row: &duckdb::Row<'_>| -> duckdb::Result<TripTotals> {
        Ok(TripTotals {
            acoustic: row.get(0)?,
            electric: row.get(1)?,
        })
    };

    match from_month {
        Some(month) => stmt.query_row(duckdb::params![bind, month.key()], map_row),
        None => stmt.query_row(duckdb::params![bind], map_row),
    }
}

/// Earliest calendar day on which the selection saw an e-bike trip.
pub fn query_first_electric_date(
    conn: &Connection,
    predicate: &FilterPredicate,
) -> Result<Option<NaiveDate>, QueryError> {
    let sql = format!(
        "SELECT year, month, day FROM station_days_all
         WHERE {} AND (electric_arrive > 0 OR electric_depart > 0)
         ORDER BY year, month, day
         LIMIT 1",
        predicate.sql_condition()
    );

    let mut stmt = conn.prepare(&sql)?;
    let bind = predicate.bind_value();
    let parts: Option<(i32, u32, u32)> = stmt
        .query_row(duckdb::params![bind], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })
        .optional()?;

    parts
        .map(|(year, month, day)| calendar_date(year, month, day))
        .transpose()
}
