use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{CalendarDate, CurrencyCode, DateRange, ValidationError};

/// Maximum number of currencies in a selection (one base plus two targets).
pub const MAX_CURRENCIES: usize = 3;

/// The user's filter choice: an ordered currency list and a date range.
///
/// The first currency is the base; the rest are comparison targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFilterSelection")]
pub struct FilterSelection {
    currencies: Vec<CurrencyCode>,
    pub date_range: DateRange,
}

#[derive(Deserialize)]
struct RawFilterSelection {
    currencies: Vec<CurrencyCode>,
    date_range: DateRange,
}

impl TryFrom<RawFilterSelection> for FilterSelection {
    type Error = ValidationError;

    fn try_from(value: RawFilterSelection) -> Result<Self, Self::Error> {
        Self::new(value.currencies, value.date_range)
    }
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            currencies: Vec::new(),
            date_range: DateRange::default(),
        }
    }
}

impl FilterSelection {
    pub fn new(
        currencies: Vec<CurrencyCode>,
        date_range: DateRange,
    ) -> Result<Self, ValidationError> {
        validate_currencies(&currencies)?;
        Ok(Self {
            currencies,
            date_range,
        })
    }

    pub fn currencies(&self) -> &[CurrencyCode] {
        &self.currencies
    }

    pub fn base(&self) -> Option<CurrencyCode> {
        self.currencies.first().copied()
    }

    pub fn targets(&self) -> &[CurrencyCode] {
        self.currencies.get(1..).unwrap_or_default()
    }

    /// Comparison needs a base plus at least one target.
    pub fn is_comparable(&self) -> bool {
        self.currencies.len() >= 2
    }

    pub fn set_currencies(&mut self, currencies: Vec<CurrencyCode>) -> Result<(), ValidationError> {
        validate_currencies(&currencies)?;
        self.currencies = currencies;
        Ok(())
    }

    pub fn add_currency(&mut self, code: CurrencyCode) -> Result<(), ValidationError> {
        let mut next = self.currencies.clone();
        next.push(code);
        self.set_currencies(next)
    }

    /// Returns whether the code was present.
    pub fn remove_currency(&mut self, code: CurrencyCode) -> bool {
        let before = self.currencies.len();
        self.currencies.retain(|existing| *existing != code);
        before != self.currencies.len()
    }
}

fn validate_currencies(currencies: &[CurrencyCode]) -> Result<(), ValidationError> {
    if currencies.len() > MAX_CURRENCIES {
        return Err(ValidationError::TooManyCurrencies {
            count: currencies.len(),
            max: MAX_CURRENCIES,
        });
    }

    let mut seen = BTreeSet::new();
    for code in currencies {
        if !seen.insert(*code) {
            return Err(ValidationError::DuplicateCurrency {
                code: code.to_string(),
            });
        }
    }

    Ok(())
}

/// One observation for one currency pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    pub date: CalendarDate,
    pub rate: f64,
}

impl RatePoint {
    pub const fn new(date: CalendarDate, rate: f64) -> Self {
        Self { date, rate }
    }
}

/// Raw per-pair fetch result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSeries {
    pub base_currency: CurrencyCode,
    pub target_currency: CurrencyCode,
    pub points: Vec<RatePoint>,
}

impl PairSeries {
    pub fn new(
        base_currency: CurrencyCode,
        target_currency: CurrencyCode,
        points: Vec<RatePoint>,
    ) -> Self {
        Self {
            base_currency,
            target_currency,
            points,
        }
    }
}

/// Date-indexed, currency-keyed pivot of pair series.
///
/// Sparse: a missing (date, currency) combination is absent, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateMatrix(BTreeMap<CalendarDate, BTreeMap<CurrencyCode, f64>>);

impl RateMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites any existing value for the same (date, currency).
    pub fn insert(&mut self, date: CalendarDate, currency: CurrencyCode, rate: f64) {
        self.0.entry(date).or_default().insert(currency, rate);
    }

    pub fn get(&self, date: CalendarDate, currency: CurrencyCode) -> Option<f64> {
        self.0.get(&date).and_then(|row| row.get(&currency)).copied()
    }

    pub fn row(&self, date: CalendarDate) -> Option<&BTreeMap<CurrencyCode, f64>> {
        self.0.get(&date)
    }

    /// Distinct dates in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = CalendarDate> + '_ {
        self.0.keys().copied()
    }

    /// Number of distinct dates.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Linearize into one row per date, ascending by calendar date.
    pub fn rows(&self) -> Vec<MatrixRow> {
        self.0
            .iter()
            .map(|(date, rates)| MatrixRow {
                date: *date,
                rates: rates.clone(),
            })
            .collect()
    }
}

/// A single date's rates, as handed to presentation code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub date: CalendarDate,
    pub rates: BTreeMap<CurrencyCode, f64>,
}

/// Published data value of a settled query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub base_currency: CurrencyCode,
    pub target_currencies: BTreeSet<CurrencyCode>,
    pub date_range: DateRange,
    pub matrix: RateMatrix,
    pub point_count: usize,
}

impl QueryResult {
    pub fn empty(base_currency: CurrencyCode, date_range: DateRange) -> Self {
        Self {
            base_currency,
            target_currencies: BTreeSet::new(),
            date_range,
            matrix: RateMatrix::new(),
            point_count: 0,
        }
    }
}
