use chrono::{Duration, NaiveDate, Utc};

/// Calendar date used to anchor timelines and chart windows. Dates are reported in UTC.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// `days` consecutive calendar dates ending at `end` (inclusive), oldest first.
pub fn trailing_days(end: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..i64::from(days))
        .rev()
        .map(|offset| end - Duration::days(offset))
        .collect()
}
