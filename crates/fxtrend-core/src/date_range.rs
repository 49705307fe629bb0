//! Date boundary helpers for the query window.
//!
//! Everything here is a pure function of its inputs; only [`default_range`]
//! reads the clock, and it delegates to [`default_range_on`].

use crate::{CalendarDate, DateRange, ValidationError};

/// Maximum query window in years.
pub const MAX_RANGE_YEARS: i32 = 2;

/// Maximum query window in days (`MAX_RANGE_YEARS * 365`).
pub const MAX_RANGE_DAYS: i64 = MAX_RANGE_YEARS as i64 * 365;

/// Default window length in years.
pub const DEFAULT_RANGE_YEARS: i32 = 1;

/// Today minus one year through today (UTC calendar date).
pub fn default_range() -> DateRange {
    default_range_on(CalendarDate::today())
}

/// `today` minus one year through `today`.
pub fn default_range_on(today: CalendarDate) -> DateRange {
    let start = today
        .checked_sub_years(DEFAULT_RANGE_YEARS)
        .unwrap_or(today);
    DateRange::new(start, today).unwrap_or_else(|_| DateRange::single_day(today))
}

/// Earliest start date accepted for `end_date`.
///
/// This is `end_date` minus [`MAX_RANGE_YEARS`] calendar years, pulled
/// forward when a leap day would make that span exceed [`MAX_RANGE_DAYS`].
/// It can therefore be one day later than the plain calendar subtraction:
/// for an end of 2024-06-15 it returns 2022-06-16, not 2022-06-15, so that
/// every start it allows also passes [`is_valid_range`].
pub fn max_start_date(end_date: CalendarDate) -> CalendarDate {
    let by_years = end_date.checked_sub_years(MAX_RANGE_YEARS);
    let by_days = end_date.checked_sub_days(MAX_RANGE_DAYS);
    match (by_years, by_days) {
        (Some(years), Some(days)) => years.max(days),
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => end_date,
    }
}

pub fn is_valid_range(start_date: CalendarDate, end_date: CalendarDate) -> bool {
    validate_range(start_date, end_date).is_ok()
}

/// Like [`is_valid_range`] but reports why a range is rejected.
pub fn validate_range(
    start_date: CalendarDate,
    end_date: CalendarDate,
) -> Result<(), ValidationError> {
    if start_date > end_date {
        return Err(ValidationError::StartAfterEnd {
            start: start_date.to_string(),
            end: end_date.to_string(),
        });
    }

    let days = start_date.days_until(end_date);
    if days > MAX_RANGE_DAYS {
        return Err(ValidationError::RangeTooLong {
            days,
            max_days: MAX_RANGE_DAYS,
        });
    }

    Ok(())
}

pub fn display_format(date: CalendarDate) -> String {
    date.display()
}
