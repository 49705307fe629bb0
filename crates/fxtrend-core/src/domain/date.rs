use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, Weekday};

use crate::date_range;
use crate::ValidationError;

/// Date-only calendar value rendered canonically as `YYYY-MM-DD`.
///
/// No offsets or instants are involved, so values never shift across time
/// zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(Date);

impl CalendarDate {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input.trim(), format_description!("[year]-[month]-[day]"))
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    /// Current date in UTC.
    pub fn today() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    pub const fn into_inner(self) -> Date {
        self.0
    }

    pub const fn weekday(self) -> Weekday {
        self.0.weekday()
    }

    /// Same month/day `years` earlier; Feb 29 clamps to Feb 28.
    pub fn checked_sub_years(self, years: i32) -> Option<Self> {
        let year = self.0.year().checked_sub(years)?;
        let (month, day) = (self.0.month(), self.0.day());
        Date::from_calendar_date(year, month, day)
            .or_else(|_| Date::from_calendar_date(year, month, day.saturating_sub(1)))
            .ok()
            .map(Self)
    }

    pub fn checked_sub_days(self, days: i64) -> Option<Self> {
        self.0.checked_sub(Duration::days(days)).map(Self)
    }

    pub fn checked_add_days(self, days: i64) -> Option<Self> {
        self.0.checked_add(Duration::days(days)).map(Self)
    }

    pub fn next_day(self) -> Option<Self> {
        self.0.next_day().map(Self)
    }

    /// Signed number of days from `self` to `other`.
    pub fn days_until(self, other: Self) -> i64 {
        (other.0 - self.0).whole_days()
    }

    /// Human-readable rendering such as `Jan 5, 2024`.
    pub fn display(self) -> String {
        self.0
            .format(format_description!(
                "[month repr:short] [day padding:none], [year]"
            ))
            .unwrap_or_else(|_| self.to_string())
    }
}

impl From<Date> for CalendarDate {
    fn from(value: Date) -> Self {
        Self(value)
    }
}

impl Display for CalendarDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl Serialize for CalendarDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

/// Inclusive calendar range bounded by the maximum query window.
///
/// The fields can only change through validated setters; a rejected
/// proposal leaves the previous range in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start_date: CalendarDate,
    end_date: CalendarDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start_date: CalendarDate,
    end_date: CalendarDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = ValidationError;

    fn try_from(value: RawDateRange) -> Result<Self, Self::Error> {
        Self::new(value.start_date, value.end_date)
    }
}

impl DateRange {
    pub fn new(start_date: CalendarDate, end_date: CalendarDate) -> Result<Self, ValidationError> {
        date_range::validate_range(start_date, end_date)?;
        Ok(Self {
            start_date,
            end_date,
        })
    }

    pub const fn single_day(date: CalendarDate) -> Self {
        Self {
            start_date: date,
            end_date: date,
        }
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(CalendarDate::parse(start)?, CalendarDate::parse(end)?)
    }

    pub const fn start_date(&self) -> CalendarDate {
        self.start_date
    }

    pub const fn end_date(&self) -> CalendarDate {
        self.end_date
    }

    pub fn days(&self) -> i64 {
        self.start_date.days_until(self.end_date)
    }

    pub fn set_start(&mut self, start_date: CalendarDate) -> Result<(), ValidationError> {
        self.set(start_date, self.end_date)
    }

    pub fn set_end(&mut self, end_date: CalendarDate) -> Result<(), ValidationError> {
        self.set(self.start_date, end_date)
    }

    pub fn set(
        &mut self,
        start_date: CalendarDate,
        end_date: CalendarDate,
    ) -> Result<(), ValidationError> {
        *self = Self::new(start_date, end_date)?;
        Ok(())
    }
}

impl Default for DateRange {
    fn default() -> Self {
        date_range::default_range()
    }
}
