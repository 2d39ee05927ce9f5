use crate::query::selector::FilterPredicate;
use chrono::{Datelike, NaiveDate};
use duckdb::Connection;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Aggregated counts for one time bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub year: i32,
    pub month: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    pub label: String,
    pub acoustic: u64,
    pub electric: u64,
    pub acoustic_arrive: u64,
    pub acoustic_depart: u64,
    pub electric_arrive: u64,
    pub electric_depart: u64,
    pub arrive: u64,
    pub depart: u64,
    pub total: u64,
}

impl ChartPoint {
    /// Build a point from summed
    /// `[acoustic_arrive, acoustic_depart, electric_arrive, electric_depart]`.
    pub fn from_counters(year: i32, month: u32, day: Option<u32>, counters: [u64; 4]) -> Self {
        let [acoustic_arrive, acoustic_depart, electric_arrive, electric_depart] = counters;
        Self {
            year,
            month,
            day,
            label: bucket_label(year, month, day),
            acoustic: acoustic_arrive + acoustic_depart,
            electric: electric_arrive + electric_depart,
            acoustic_arrive,
            acoustic_depart,
            electric_arrive,
            electric_depart,
            arrive: acoustic_arrive + electric_arrive,
            depart: acoustic_depart + electric_depart,
            total: acoustic_arrive + acoustic_depart + electric_arrive + electric_depart,
        }
    }

    pub const fn bucket(&self) -> Bucket {
        match self.day {
            Some(day) => Bucket::Day {
                year: self.year,
                month: self.month,
                day,
            },
            None => Bucket::Month {
                year: self.year,
                month: self.month,
            },
        }
    }
}

/// Bucket size for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Daily,
    Monthly,
}

impl Granularity {
    pub const fn from_daily_flag(daily: bool) -> Self {
        if daily {
            Self::Daily
        } else {
            Self::Monthly
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
        }
    }

    /// Integer SQL expression that orders rows at this granularity.
    const fn key_expr(self) -> &'static str {
        match self {
            Self::Daily => "year * 10000 + month * 100 + day",
            Self::Monthly => "year * 100 + month",
        }
    }

    /// The value of [`Self::key_expr`] for a calendar date.
    fn key_of(self, date: NaiveDate) -> i64 {
        let month_key = i64::from(date.year()) * 100 + i64::from(date.month());
        match self {
            Self::Daily => month_key * 100 + i64::from(date.day()),
            Self::Monthly => month_key,
        }
    }
}

/// Identity of a time bucket, ordered by calendar position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Month { year: i32, month: u32 },
    Day { year: i32, month: u32, day: u32 },
}

impl Bucket {
    const fn sort_key(self) -> (i32, u32, u32) {
        match self {
            Self::Month { year, month } => (year, month, 0),
            Self::Day { year, month, day } => (year, month, day),
        }
    }
}

impl Ord for Bucket {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Bucket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Presentation label: `Jan '24` for a month, `Jan 5 '24` for a day.
pub fn bucket_label(year: i32, month: u32, day: Option<u32>) -> String {
    let Some(date) = NaiveDate::from_ymd_opt(year, month, day.unwrap_or(1)) else {
        return format!("{year}-{month:02}");
    };
    match day {
        Some(_) => date.format("%b %-d '%y").to_string(),
        None => date.format("%b '%y").to_string(),
    }
}

/// Aggregate station-day counters for a selection into time buckets.
///
/// The range is inclusive and compared on calendar parts: (year, month) for
/// monthly buckets, (year, month, day) for daily ones. Buckets without rows
/// are omitted. The result is sorted ascending by bucket.
pub fn query_series(
    conn: &Connection,
    predicate: &FilterPredicate,
    start_date: NaiveDate,
    end_date: NaiveDate,
    granularity: Granularity,
) -> Result<Vec<ChartPoint>, duckdb::Error> {
    let key = granularity.key_expr();
    let (day_col, group_by) = match granularity {
        Granularity::Daily => ("day", "year, month, day"),
        Granularity::Monthly => ("CAST(NULL AS INTEGER)", "year, month"),
    };

    let sql = format!(
        "SELECT year, month, {day_col} AS bucket_day,
                CAST(COALESCE(SUM(acoustic_arrive), 0) AS BIGINT),
                CAST(COALESCE(SUM(acoustic_depart), 0) AS BIGINT),
                CAST(COALESCE(SUM(electric_arrive), 0) AS BIGINT),
                CAST(COALESCE(SUM(electric_depart), 0) AS BIGINT)
         FROM station_days_all
         WHERE {} AND {key} >= ? AND {key} <= ?
         GROUP BY {group_by}
         ORDER BY {group_by}",
        predicate.sql_condition()
    );

    let bind = predicate.bind_value();
    let start_key = granularity.key_of(start_date);
    let end_key = granularity.key_of(end_date);

    let mut stmt = conn.prepare(&sql)?;
    let mut points: Vec<ChartPoint> = stmt
        .query_map(duckdb::params![bind, start_key, end_key], |row| {
            Ok(ChartPoint::from_counters(
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                [row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?],
            ))
        })?
        .collect::<Result<_, _>>()?;

    points.sort_by_key(ChartPoint::bucket);
    Ok(points)
}
