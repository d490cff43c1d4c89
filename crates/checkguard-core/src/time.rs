use crate::error::CoreError;
use chrono::{DateTime, Local, NaiveDate, Utc};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn now_utc() -> i64 {
    Utc::now().timestamp()
}

/// Calendar date (UTC) a timestamp falls on; used for `incident_date`.
pub fn incident_date(ts: i64) -> Result<NaiveDate, CoreError> {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.date_naive())
        .ok_or(CoreError::InvalidTimestamp)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| CoreError::InvalidTimestamp)
}

pub fn format_timestamp_datetime(ts: i64) -> String {
    let dt = DateTime::<Utc>::from_timestamp(ts, 0)
        .unwrap_or_default()
        .with_timezone(&Local);
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}
