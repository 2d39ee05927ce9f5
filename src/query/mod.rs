pub mod cache;
pub mod catalog;
pub mod freshness;
pub mod selector;
pub mod series;
pub mod timeframe;
pub mod topline;

use chrono::NaiveDate;

/// Failure of a read against the station-day store.
#[derive(Debug)]
pub enum QueryError {
    /// A valid selection matched zero rows.
    NoData,
    /// A stored (year, month, day) triple is not a calendar date.
    InvalidDate { year: i32, month: u32, day: u32 },
    Database(duckdb::Error),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoData => write!(f, "No data for this selection"),
            Self::InvalidDate { year, month, day } => {
                write!(f, "Invalid stored date: {year}-{month:02}-{day:02}")
            }
            Self::Database(e) => write!(f, "Database error: {e}"),
        }
    }
}

impl std::error::Error for QueryError {}

impl From<duckdb::Error> for QueryError {
    fn from(e: duckdb::Error) -> Self {
        Self::Database(e)
    }
}

/// Build a calendar date from stored parts (month is 1-based).
pub(crate) fn calendar_date(year: i32, month: u32, day: u32) -> Result<NaiveDate, QueryError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(QueryError::InvalidDate { year, month, day })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_date() {
        assert_eq!(
            calendar_date(2024, 2, 29).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(matches!(
            calendar_date(2023, 2, 29),
            Err(QueryError::InvalidDate {
                year: 2023,
                month: 2,
                day: 29
            })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(QueryError::NoData.to_string(), "No data for this selection");
        assert_eq!(
            QueryError::InvalidDate {
                year: 2024,
                month: 13,
                day: 1
            }
            .to_string(),
            "Invalid stored date: 2024-13-01"
        );
    }
}
