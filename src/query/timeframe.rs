use crate::query::selector::FilterPredicate;
use crate::query::{calendar_date, QueryError};
use chrono::{Datelike, NaiveDate};
use duckdb::{Connection, OptionalExt};
use serde::{Deserialize, Serialize};

/// Inclusive range of calendar days over which a selection has data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeframe {
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

/// A calendar month. `{ year: 0, month: 0 }` stands for "no data at all".
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MonthStamp {
    pub year: i32,
    pub month: u32,
}

impl MonthStamp {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// `year * 100 + month`, comparable with the same expression in SQL.
    pub fn key(self) -> i64 {
        i64::from(self.year) * 100 + i64::from(self.month)
    }
}

#[derive(Clone, Copy)]
enum Edge {
    First,
    Last,
}

impl Edge {
    const fn order(self) -> &'static str {
        match self {
            Self::First => "ASC",
            Self::Last => "DESC",
        }
    }
}

/// Find the first and last calendar days with data for a selection.
///
/// Returns [`QueryError::NoData`] when nothing matches.
pub fn query_timeframe(
    conn: &Connection,
    predicate: &FilterPredicate,
) -> Result<Timeframe, QueryError> {
    let first = query_edge_day(conn, predicate, Edge::First)?;
    let last = query_edge_day(conn, predicate, Edge::Last)?;

    match (first, last) {
        (Some(first_date), Some(last_date)) => Ok(Timeframe {
            first_date,
            last_date,
        }),
        _ => Err(QueryError::NoData),
    }
}

fn query_edge_day(
    conn: &Connection,
    predicate: &FilterPredicate,
    edge: Edge,
) -> Result<Option<NaiveDate>, QueryError> {
    let order = edge.order();
    let sql = format!(
        "SELECT year, month, day FROM station_days_all
         WHERE {}
         ORDER BY year {order}, month {order}, day {order}
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

/// The most recent month present anywhere in the store.
pub fn query_most_recent(conn: &Connection) -> Result<MonthStamp, duckdb::Error> {
    let mut stmt = conn.prepare(
        "SELECT year, month FROM station_days_all
         ORDER BY year DESC, month DESC, day DESC
         LIMIT 1",
    )?;
    let stamp = stmt
        .query_row([], |row| {
            Ok(MonthStamp {
                year: row.get(0)?,
                month: row.get(1)?,
            })
        })
        .optional()?;
    Ok(stamp.unwrap_or_default())
}
