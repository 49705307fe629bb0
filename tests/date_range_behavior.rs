//! Behavior-driven tests for date range rules
//!
//! These tests verify the query window bounds: the two-year limit, its
//! inclusive edge across leap years, and how range edits are rejected.

use fxtrend_core::{
    default_range_on, display_format, is_valid_range, max_start_date, CalendarDate, DateRange,
    FilterSelection, ValidationError, MAX_RANGE_DAYS,
};

fn date(input: &str) -> CalendarDate {
    CalendarDate::parse(input).expect("test date should parse")
}

// =============================================================================
// Date Range: Two-Year Boundary
// =============================================================================

#[test]
fn when_span_is_exactly_730_days_range_is_valid() {
    // Given: An end date and a start exactly 730 days earlier
    let end = date("2024-06-15");
    let start = end.checked_sub_days(MAX_RANGE_DAYS).expect("in range");

    // When / Then: The inclusive edge is accepted
    assert_eq!(start, date("2022-06-16"));
    assert!(is_valid_range(start, end));
}

#[test]
fn when_span_is_one_day_under_the_edge_range_is_valid() {
    let end = date("2024-06-15");
    let start = end.checked_sub_days(MAX_RANGE_DAYS - 1).expect("in range");
    assert!(is_valid_range(start, end));
}

#[test]
fn when_span_is_one_day_over_the_edge_range_is_rejected() {
    // Given: A span of 731 days, which crosses a leap day
    let start = date("2022-06-15");
    let end = date("2024-06-15");

    // When: The range is validated
    let result = DateRange::new(start, end);

    // Then: It is rejected with the measured span
    assert_eq!(
        result,
        Err(ValidationError::RangeTooLong {
            days: 731,
            max_days: 730
        })
    );
    assert!(!is_valid_range(start, end));
}

#[test]
fn when_no_leap_day_is_crossed_two_calendar_years_is_valid() {
    // Given: Two calendar years that do not contain Feb 29
    let start = date("2021-03-01");
    let end = date("2023-03-01");

    // Then: The span is exactly 730 days and accepted
    assert_eq!(start.days_until(end), 730);
    assert!(is_valid_range(start, end));
}

#[test]
fn max_start_date_never_exceeds_the_day_limit() {
    for end in ["2024-06-15", "2024-02-29", "2023-03-01", "2025-01-01"] {
        let end = date(end);
        let start = max_start_date(end);

        assert!(is_valid_range(start, end), "max start for {end} must be valid");
        let earlier = start.checked_sub_days(1).expect("in range");
        assert!(!is_valid_range(earlier, end), "one day earlier than {start} must fail");
    }
}

#[test]
fn when_end_precedes_start_range_is_rejected() {
    let result = DateRange::parse("2024-02-01", "2024-01-31");
    assert!(matches!(result, Err(ValidationError::StartAfterEnd { .. })));
}

#[test]
fn single_day_range_is_valid() {
    let range = DateRange::parse("2024-01-31", "2024-01-31").expect("single day is valid");
    assert_eq!(range.days(), 0);
}

// =============================================================================
// Date Range: Defaults and Edits
// =============================================================================

#[test]
fn default_range_spans_one_year_back_from_today() {
    // Given: A fixed "today"
    let today = date("2024-03-15");

    // When: The default range is computed
    let range = default_range_on(today);

    // Then: It covers today minus one year through today
    assert_eq!(range.start_date(), date("2023-03-15"));
    assert_eq!(range.end_date(), today);
}

#[test]
fn default_range_from_a_leap_day_clamps_to_february_28() {
    let range = default_range_on(date("2024-02-29"));
    assert_eq!(range.start_date(), date("2023-02-28"));
}

#[test]
fn rejected_edit_keeps_the_previous_range() {
    // Given: A valid range
    let mut range = DateRange::parse("2024-01-01", "2024-03-31").expect("valid range");
    let before = range;

    // When: The start is moved past the end
    let result = range.set_start(date("2024-04-01"));

    // Then: The edit fails and nothing changes
    assert!(result.is_err());
    assert_eq!(range, before);
}

#[test]
fn persisted_range_that_breaks_the_limit_does_not_deserialize() {
    let raw = r#"{"currencies":["USD","EUR"],"date_range":{"start_date":"2020-01-01","end_date":"2024-01-01"}}"#;
    assert!(serde_json::from_str::<FilterSelection>(raw).is_err());
}

#[test]
fn display_format_is_short_month_day_year() {
    assert_eq!(display_format(date("2024-01-05")), "Jan 5, 2024");
}
