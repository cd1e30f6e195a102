use chrono::{Months, NaiveDate};

/// Calendar dates travel as plain `YYYY-MM-DD` strings, never as timestamps,
/// so a date entered in one time zone is the same date everywhere.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a strict `YYYY-MM-DD` string into a calendar date.
///
/// Rejects unpadded components (`2024-1-5`) and impossible dates (`2023-02-30`).
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.len() != 10 {
        return None;
    }
    let date = NaiveDate::parse_from_str(value, DATE_FORMAT).ok()?;
    // Round-trip check catches anything chrono was lenient about.
    (date.format(DATE_FORMAT).to_string() == value).then_some(date)
}

/// `true` when `value` is a strict, real `YYYY-MM-DD` date.
pub fn is_valid_date_string(value: &str) -> bool {
    parse_calendar_date(value).is_some()
}

/// First day of the trailing twelve-month window ending at `as_of` (inclusive).
///
/// 29 February falls back to 28 February of the previous year.
pub fn twelve_months_before(as_of: NaiveDate) -> NaiveDate {
    as_of
        .checked_sub_months(Months::new(12))
        .unwrap_or(NaiveDate::MIN)
}
