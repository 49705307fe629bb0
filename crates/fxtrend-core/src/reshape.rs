//! Pivot per-pair series into the date-indexed matrix used by chart and grid.
//!
//! This layer knows nothing about loading, errors or the network.

use serde::{Deserialize, Serialize};

use crate::{CalendarDate, CurrencyCode, PairSeries, QueryResult, RateMatrix};

/// Build the sparse matrix `date -> target currency -> rate`.
///
/// Duplicate (date, target) observations resolve by input order: the last
/// one encountered wins, whether the duplicates come from the same series
/// or from different ones.
pub fn build_matrix(series: &[PairSeries]) -> RateMatrix {
    let mut matrix = RateMatrix::new();
    for pair in series {
        for point in &pair.points {
            matrix.insert(point.date, pair.target_currency, point.rate);
        }
    }
    matrix
}

/// One line of a chart: the points available for a single currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub currency: CurrencyCode,
    pub points: Vec<(CalendarDate, f64)>,
}

/// Per-target point lists in ascending date order. Dates without a rate
/// for a currency are skipped rather than zero-filled.
pub fn chart_series(result: &QueryResult) -> Vec<ChartSeries> {
    result
        .target_currencies
        .iter()
        .map(|currency| ChartSeries {
            currency: *currency,
            points: result
                .matrix
                .dates()
                .filter_map(|date| {
                    result
                        .matrix
                        .get(date, *currency)
                        .map(|rate| (date, rate))
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RatePoint;

    fn point(date: &str, rate: f64) -> RatePoint {
        RatePoint::new(CalendarDate::parse(date).expect("test date"), rate)
    }

    #[test]
    fn duplicate_within_one_series_keeps_the_last_value() {
        let series = PairSeries::new(
            CurrencyCode::Usd,
            CurrencyCode::Eur,
            vec![point("2024-01-01", 0.90), point("2024-01-01", 0.95)],
        );

        let matrix = build_matrix(&[series]);
        let date = CalendarDate::parse("2024-01-01").expect("date");
        assert_eq!(matrix.get(date, CurrencyCode::Eur), Some(0.95));
        assert_eq!(matrix.len(), 1);
    }

    #[test]
    fn empty_input_builds_empty_matrix() {
        assert!(build_matrix(&[]).is_empty());
    }
}
