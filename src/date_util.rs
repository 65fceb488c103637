use chrono::{NaiveDateTime, Utc};

/// Storage format for timestamps. Matches SQLite's `datetime('now')`
/// output, so lexicographic comparison in SQL equals chronological order.
pub const SQL_DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Current time in UTC. Sub-second precision is dropped on storage.
pub fn now_utc() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Format a timestamp for storage.
pub fn to_sql_datetime(dt: NaiveDateTime) -> String {
    dt.format(SQL_DATETIME_FMT).to_string()
}

/// Parse a stored timestamp. Returns None for anything that is not in
/// the storage format.
pub fn parse_sql_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, SQL_DATETIME_FMT).ok()
}
