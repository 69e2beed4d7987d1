//! Date parsing and the trailing one-year window.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::analyzers::types::ActivityRow;

/// Length of the trailing window, counted back from the latest date.
pub const WINDOW_DAYS: i64 = 365;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses the timestamp formats the datastore emits. Date-only values are
/// taken as midnight; offsets are dropped in favor of the local wall time.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|d| d.naive_local())
        })
}

/// Keeps rows dated no earlier than `max(date) - 365 days` and sorts them
/// ascending by date. The sort is stable, so same-date rows keep file order.
pub fn trailing_window(mut rows: Vec<ActivityRow>) -> Vec<ActivityRow> {
    let Some(latest) = rows.iter().map(|r| r.date).max() else {
        return rows;
    };
    let cutoff = latest
        .checked_sub_signed(TimeDelta::days(WINDOW_DAYS))
        .unwrap_or(NaiveDateTime::MIN);

    rows.retain(|r| r.date >= cutoff);
    rows.sort_by_key(|r| r.date);
    rows
}
