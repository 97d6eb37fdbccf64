use crate::Timestamp;
use chrono::{DateTime, Utc};

/// Returns the current timestamp in milliseconds.
#[must_use]
pub fn timestamp() -> Timestamp {
    Utc::now().timestamp_millis()
}

fn to_datetime(ts: Timestamp) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ts)
}

/// Formats a tick for the time axis, e.g. `2012-03-07 14:30`.
#[must_use]
pub fn format_tick(ts: Timestamp) -> String {
    to_datetime(ts).map_or_else(
        || ts.to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M").to_string(),
    )
}

/// Formats a run date for chart titles, e.g. `7 Mar 2012 14:30:00 GMT`.
#[must_use]
pub fn format_run_date(ts: Timestamp) -> String {
    to_datetime(ts).map_or_else(
        || ts.to_string(),
        |dt| dt.format("%-d %b %Y %H:%M:%S GMT").to_string(),
    )
}
