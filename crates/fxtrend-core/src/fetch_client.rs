//! Issues per-pair rate lookups and assembles a [`QueryResult`].

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::provider::{BatchRateRequest, RateProvider};
use crate::reshape::build_matrix;
use crate::{CurrencyCode, DateRange, FetchFailure, PairSeries, QueryResult};

/// Default ceiling for one batch request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a fetch that was not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Completed(QueryResult),
    /// The request's token was cancelled first. Not an error.
    Cancelled,
}

impl FetchOutcome {
    pub fn into_result(self) -> Option<QueryResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Cancelled => None,
        }
    }
}

/// Explicitly constructed client around an injectable [`RateProvider`].
#[derive(Clone)]
pub struct RateFetchClient {
    provider: Arc<dyn RateProvider>,
    timeout: Duration,
}

impl RateFetchClient {
    pub fn new(provider: Arc<dyn RateProvider>) -> Self {
        Self {
            provider,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Fetch `base` against each target over `range`.
    ///
    /// Targets equal to `base` and repeated targets are dropped first. With
    /// nothing left the result is empty and no request is made.
    pub async fn fetch_pairs(
        &self,
        base: CurrencyCode,
        targets: &[CurrencyCode],
        range: &DateRange,
        cancel: &CancelToken,
    ) -> Result<FetchOutcome, FetchFailure> {
        let mut seen = BTreeSet::new();
        let targets: Vec<CurrencyCode> = targets
            .iter()
            .copied()
            .filter(|target| *target != base && seen.insert(*target))
            .collect();

        let request = BatchRateRequest::for_targets(base, &targets, range);
        if request.is_empty() {
            return Ok(FetchOutcome::Completed(QueryResult::empty(base, *range)));
        }

        if cancel.is_cancelled() {
            return Ok(FetchOutcome::Cancelled);
        }

        debug!(
            provider = self.provider.name(),
            %base,
            pairs = request.pairs.len(),
            start = %range.start_date(),
            end = %range.end_date(),
            "fetching rate pairs"
        );

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%base, "rate fetch cancelled");
                return Ok(FetchOutcome::Cancelled);
            }
            outcome = tokio::time::timeout(self.timeout, self.provider.fetch_batch(&request)) => {
                match outcome {
                    Ok(response) => response?,
                    Err(_) => {
                        return Err(FetchFailure::timeout(format!(
                            "rate request exceeded {} ms",
                            self.timeout.as_millis()
                        )));
                    }
                }
            }
        };

        if !response.success {
            return Err(FetchFailure::provider(response.failure_message(), None));
        }

        let mut series = Vec::with_capacity(response.results.len());
        for result in response.results {
            let target = match result.target_currency.parse::<CurrencyCode>() {
                Ok(code) if targets.contains(&code) => code,
                Ok(code) => {
                    warn!(%code, "provider returned a currency that was not requested");
                    continue;
                }
                Err(error) => {
                    warn!(%error, "provider returned an unsupported currency");
                    continue;
                }
            };
            series.push(PairSeries::new(base, target, result.data));
        }

        let matrix = build_matrix(&series);
        let point_count = matrix.len();
        Ok(FetchOutcome::Completed(QueryResult {
            base_currency: base,
            target_currencies: targets.into_iter().collect(),
            date_range: *range,
            matrix,
            point_count,
        }))
    }
}
