//! Rate-provider boundary: wire types and the adapter contract.
//!
//! # Wire format
//!
//! | Direction | Type | Shape |
//! |-----------|------|-------|
//! | Request | [`BatchRateRequest`] | `{pairs: [{base, target, start_date, end_date}]}` |
//! | Response | [`BatchRateResponse`] | `{success, results: [{target_currency, data: [{date, rate}]}]}` |
//!
//! Adapters live in [`crate::adapters`].

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{CalendarDate, CurrencyCode, DateRange, FetchFailure, RatePoint};

/// One logical (base, target) historical lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairRequest {
    pub base: CurrencyCode,
    pub target: CurrencyCode,
    pub start_date: CalendarDate,
    pub end_date: CalendarDate,
}

impl PairRequest {
    pub fn new(base: CurrencyCode, target: CurrencyCode, range: &DateRange) -> Self {
        Self {
            base,
            target,
            start_date: range.start_date(),
            end_date: range.end_date(),
        }
    }
}

/// Batch of pair lookups sent to a provider in one logical call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchRateRequest {
    pub pairs: Vec<PairRequest>,
}

impl BatchRateRequest {
    pub fn for_targets(base: CurrencyCode, targets: &[CurrencyCode], range: &DateRange) -> Self {
        Self {
            pairs: targets
                .iter()
                .map(|target| PairRequest::new(base, *target, range))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Series for one requested target.
///
/// `target_currency` stays a string on the wire so that a provider naming an
/// unsupported code can be skipped instead of failing the whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairResult {
    pub target_currency: String,
    #[serde(default)]
    pub data: Vec<RatePoint>,
}

impl PairResult {
    pub fn new(target_currency: CurrencyCode, data: Vec<RatePoint>) -> Self {
        Self {
            target_currency: target_currency.to_string(),
            data,
        }
    }
}

/// Batch response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRateResponse {
    pub success: bool,
    #[serde(default)]
    pub results: Vec<PairResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl BatchRateResponse {
    pub fn ok(results: Vec<PairResult>) -> Self {
        Self {
            success: true,
            results,
            error: None,
            message: None,
            details: None,
        }
    }

    pub fn failure(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            error: Some(error.into()),
            message: Some(message.into()),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Human-readable failure text, preferring the most specific field.
    pub fn failure_message(&self) -> String {
        match (&self.error, &self.message, &self.details) {
            (_, _, Some(details)) if !details.is_empty() => details.clone(),
            (_, Some(message), _) => message.clone(),
            (Some(error), None, _) => error.clone(),
            (None, None, _) => String::from("provider reported failure"),
        }
    }
}

pub type ProviderFuture<'a> =
    Pin<Box<dyn Future<Output = Result<BatchRateResponse, FetchFailure>> + Send + 'a>>;

/// Contract for exchange-rate providers.
///
/// Implementations may batch pairs transport-side however they like; the
/// response must carry one [`PairResult`] per pair they could answer.
pub trait RateProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn fetch_batch<'a>(&'a self, request: &'a BatchRateRequest) -> ProviderFuture<'a>;
}
