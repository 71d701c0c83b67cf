use chrono::{DateTime, Months, NaiveDate, NaiveTime, TimeZone, Utc};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Unix seconds of midnight UTC on `date`.
pub fn midnight_epoch(date: NaiveDate) -> i64 {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
        .timestamp()
}

/// Calendar date (UTC) of an instant.
pub fn utc_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// Steps back whole months, clamping to the last day of the target month
/// (2023-08-31 minus 6 months is 2023-02-28, not the day-overflow 2023-03-03).
/// The clamped bound is never later than the overflow one, so the window only widens.
pub fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}
