use crate::query::timeframe::{MonthStamp, Timeframe};

/// Whether a selection's data stops before the most recently ingested month.
///
/// Ingestion is batched monthly, so only the (year, month) of the last day
/// is compared: data ending mid-month in the latest month is not stale.
pub fn is_stale(timeframe: &Timeframe, most_recent: MonthStamp) -> bool {
    MonthStamp::of(timeframe.last_date) < most_recent
}
