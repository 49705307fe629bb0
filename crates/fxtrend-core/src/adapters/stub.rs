use time::Weekday;

use crate::provider::{
    BatchRateRequest, BatchRateResponse, PairRequest, PairResult, ProviderFuture, RateProvider,
};
use crate::{CurrencyCode, RatePoint};

/// Deterministic offline provider used by `--mock` runs.
///
/// Publishes one point per weekday, like the reference-rate source, with a
/// smooth synthetic drift around a per-pair level.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubRateProvider;

impl StubRateProvider {
    fn level(code: CurrencyCode) -> f64 {
        let index = CurrencyCode::ALL
            .iter()
            .position(|candidate| *candidate == code)
            .unwrap_or(0);
        1.0 + index as f64 * 0.37
    }

    fn series(pair: &PairRequest) -> Vec<RatePoint> {
        let level = Self::level(pair.target) / Self::level(pair.base);
        let mut points = Vec::new();
        let mut current = Some(pair.start_date);
        while let Some(date) = current.filter(|date| *date <= pair.end_date) {
            if !matches!(date.weekday(), Weekday::Saturday | Weekday::Sunday) {
                let phase = (date.into_inner().ordinal() % 60) as f64 / 60.0;
                let drift = 0.02 * (phase * std::f64::consts::TAU).sin();
                let rate = (level * (1.0 + drift) * 10_000.0).round() / 10_000.0;
                points.push(RatePoint::new(date, rate));
            }
            current = date.next_day();
        }
        points
    }
}

impl RateProvider for StubRateProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn fetch_batch<'a>(&'a self, request: &'a BatchRateRequest) -> ProviderFuture<'a> {
        let results = request
            .pairs
            .iter()
            .map(|pair| PairResult::new(pair.target, Self::series(pair)))
            .collect();
        Box::pin(async move { Ok(BatchRateResponse::ok(results)) })
    }
}
