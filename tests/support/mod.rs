//! Test doubles shared by the integration suites.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use fxtrend_core::provider::ProviderFuture;
use fxtrend_core::{
    BatchRateRequest, BatchRateResponse, CalendarDate, FetchFailure, PairResult, RatePoint,
    RateProvider,
};

/// What the provider does with the next calls.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// One point per day of each pair's range; every rate equals the call
    /// number (1.0 for the first call, 2.0 for the second, ...).
    Serve,
    Fail(FetchFailure),
    Respond(BatchRateResponse),
}

/// Scriptable provider that records every batch it receives.
pub struct ScriptedProvider {
    calls: AtomicUsize,
    requests: Mutex<Vec<BatchRateRequest>>,
    behavior: Mutex<Behavior>,
    delay: Duration,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            behavior: Mutex::new(Behavior::Serve),
            delay,
        }
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().expect("lock") = behavior;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<BatchRateRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

impl RateProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn fetch_batch<'a>(&'a self, request: &'a BatchRateRequest) -> ProviderFuture<'a> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().expect("lock").push(request.clone());
        let behavior = self.behavior.lock().expect("lock").clone();

        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match behavior {
                Behavior::Fail(failure) => Err(failure),
                Behavior::Respond(response) => Ok(response),
                Behavior::Serve => Ok(BatchRateResponse::ok(
                    request
                        .pairs
                        .iter()
                        .map(|pair| {
                            let points = days(pair.start_date, pair.end_date)
                                .into_iter()
                                .map(|date| RatePoint::new(date, call as f64))
                                .collect();
                            PairResult::new(pair.target, points)
                        })
                        .collect(),
                )),
            }
        })
    }
}

pub fn date(input: &str) -> CalendarDate {
    CalendarDate::parse(input).expect("test date should parse")
}

fn days(start: CalendarDate, end: CalendarDate) -> Vec<CalendarDate> {
    let mut out = Vec::new();
    let mut current = Some(start);
    while let Some(day) = current.filter(|day| *day <= end) {
        out.push(day);
        current = day.next_day();
    }
    out
}
