//! Query lifecycle: debounce filter changes, keep at most one request in
//! flight, and publish `{data, loading, error}` snapshots.
//!
//! # States
//!
//! ```text
//!            filter change (enabled, >= 2 currencies)
//!   Idle ──────────────────────────────────────────▶ Debouncing ◀─┐
//!    ▲                                                   │        │ filter change
//!    │ < 2 currencies / disabled                 timer   │        │
//!    │ (from any state)                          expiry  ▼        │
//!    │                                               Fetching ────┘
//!    │                         refetch ─────────────▶    │
//!    │                                                   │ success / failure
//!    │                                                   ▼
//!    └────────────────────────────────────────────── Settled
//! ```
//!
//! Every request gets a fresh generation number and [`CancelToken`].
//! Starting a request, or changing the filters, cancels the request in
//! flight, and a completion is only committed when its generation is still
//! current, so a superseded response can never overwrite a fresher one.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::debounce::Debouncer;
use crate::fetch_client::{FetchOutcome, RateFetchClient};
use crate::{FetchFailure, FilterSelection, QueryResult};

/// Default quiet period before a filter change triggers a fetch.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPhase {
    Idle,
    Debouncing,
    Fetching,
    Settled,
}

/// Published view of the query state.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySnapshot {
    pub phase: QueryPhase,
    pub data: Option<Arc<QueryResult>>,
    pub error: Option<FetchFailure>,
}

impl QuerySnapshot {
    pub const fn idle() -> Self {
        Self {
            phase: QueryPhase::Idle,
            data: None,
            error: None,
        }
    }

    /// True exactly while a request is in flight.
    pub fn loading(&self) -> bool {
        self.phase == QueryPhase::Fetching
    }
}

struct InFlight {
    cancel: CancelToken,
    task: JoinHandle<()>,
}

impl InFlight {
    fn stop(self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

struct ControlState {
    filters: FilterSelection,
    enabled: bool,
    generation: u64,
    /// Bumped on every filter change; a timer only fires for the latest one.
    debounce_epoch: u64,
    in_flight: Option<InFlight>,
}

impl ControlState {
    fn is_active(&self) -> bool {
        self.enabled && self.filters.is_comparable()
    }
}

struct Inner {
    client: RateFetchClient,
    debouncer: Debouncer,
    control: Mutex<ControlState>,
    snapshot: watch::Sender<QuerySnapshot>,
}

/// Owner of the fetch lifecycle for one view.
///
/// Must be driven from within a Tokio runtime. Dropping the orchestrator
/// cancels any pending timer and in-flight request.
pub struct QueryOrchestrator {
    inner: Arc<Inner>,
}

impl QueryOrchestrator {
    pub fn new(client: RateFetchClient, debounce: Duration) -> Self {
        let (snapshot, _) = watch::channel(QuerySnapshot::idle());
        Self {
            inner: Arc::new(Inner {
                client,
                debouncer: Debouncer::new(debounce),
                control: Mutex::new(ControlState {
                    filters: FilterSelection::default(),
                    enabled: true,
                    generation: 0,
                    debounce_epoch: 0,
                    in_flight: None,
                }),
                snapshot,
            }),
        }
    }

    pub fn snapshot(&self) -> QuerySnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Change notifications; the receiver starts at the current snapshot.
    pub fn subscribe(&self) -> watch::Receiver<QuerySnapshot> {
        self.inner.snapshot.subscribe()
    }

    pub fn filters(&self) -> FilterSelection {
        self.inner.lock().filters.clone()
    }

    pub fn set_filters(&self, filters: FilterSelection) {
        let mut control = self.inner.lock();
        control.filters = filters;
        Inner::on_change(&self.inner, &mut control);
    }

    pub fn set_enabled(&self, enabled: bool) {
        let mut control = self.inner.lock();
        control.enabled = enabled;
        Inner::on_change(&self.inner, &mut control);
    }

    /// Skip the debounce timer and fetch now. Ignored while idle.
    pub fn refetch(&self) {
        let mut control = self.inner.lock();
        if !control.is_active() {
            return;
        }
        control.debounce_epoch += 1;
        self.inner
            .debouncer
            .fire_now(|| Inner::start_fetch(&self.inner, &mut control));
    }
}

impl Drop for QueryOrchestrator {
    fn drop(&mut self) {
        self.inner.debouncer.cancel();
        let mut control = self.inner.lock();
        control.generation += 1;
        if let Some(in_flight) = control.in_flight.take() {
            in_flight.stop();
        }
    }
}

impl Inner {
    fn lock(&self) -> std::sync::MutexGuard<'_, ControlState> {
        self.control
            .lock()
            .expect("orchestrator lock is not poisoned")
    }

    fn publish(&self, update: impl FnOnce(&mut QuerySnapshot)) {
        self.snapshot.send_if_modified(|snapshot| {
            let before = snapshot.clone();
            update(snapshot);
            *snapshot != before
        });
    }

    fn on_change(this: &Arc<Self>, control: &mut ControlState) {
        control.debounce_epoch += 1;
        if !control.is_active() {
            this.debouncer.cancel();
            control.generation += 1;
            if let Some(in_flight) = control.in_flight.take() {
                in_flight.stop();
            }
            debug!("query idle");
            this.publish(|snapshot| *snapshot = QuerySnapshot::idle());
            return;
        }

        // Whatever is in flight was asked for with the previous filters.
        if let Some(in_flight) = control.in_flight.take() {
            control.generation += 1;
            in_flight.stop();
        }

        this.publish(|snapshot| snapshot.phase = QueryPhase::Debouncing);
        debug!(
            delay_ms = this.debouncer.delay().as_millis(),
            "query debouncing"
        );
        let epoch = control.debounce_epoch;
        let weak: Weak<Self> = Arc::downgrade(this);
        this.debouncer.schedule(move || {
            if let Some(inner) = weak.upgrade() {
                Inner::debounce_elapsed(&inner, epoch);
            }
        });
    }

    /// Timer expiry for the filter change numbered `epoch`. A timer that
    /// raced a newer change loses here, under the lock.
    fn debounce_elapsed(this: &Arc<Self>, epoch: u64) {
        let mut control = this.lock();
        if control.debounce_epoch != epoch {
            debug!(epoch, current = control.debounce_epoch, "discarding stale debounce timer");
            return;
        }
        if control.is_active() {
            Inner::start_fetch(this, &mut control);
        }
    }

    fn start_fetch(this: &Arc<Self>, control: &mut ControlState) {
        if let Some(previous) = control.in_flight.take() {
            debug!(generation = control.generation, "cancelling superseded request");
            previous.stop();
        }

        control.generation += 1;
        let generation = control.generation;
        let cancel = CancelToken::new();

        let filters = control.filters.clone();
        let Some(base) = filters.base() else {
            return;
        };
        let targets = filters.targets().to_vec();
        let range = filters.date_range;

        this.publish(|snapshot| snapshot.phase = QueryPhase::Fetching);
        debug!(generation, %base, "query fetching");

        let client = this.client.clone();
        let weak = Arc::downgrade(this);
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let outcome = client.fetch_pairs(base, &targets, &range, &token).await;
            if let Some(inner) = weak.upgrade() {
                inner.commit(generation, outcome);
            }
        });

        control.in_flight = Some(InFlight { cancel, task });
    }

    fn commit(&self, generation: u64, outcome: Result<FetchOutcome, FetchFailure>) {
        let mut control = self.lock();
        if control.generation != generation {
            debug!(generation, current = control.generation, "discarding stale response");
            return;
        }

        match outcome {
            Ok(FetchOutcome::Completed(result)) => {
                control.in_flight = None;
                debug!(generation, points = result.point_count, "query settled");
                self.publish(|snapshot| {
                    *snapshot = QuerySnapshot {
                        phase: QueryPhase::Settled,
                        data: Some(Arc::new(result)),
                        error: None,
                    }
                });
            }
            Ok(FetchOutcome::Cancelled) => {}
            Err(failure) => {
                control.in_flight = None;
                debug!(generation, %failure, "query failed");
                self.publish(|snapshot| {
                    *snapshot = QuerySnapshot {
                        phase: QueryPhase::Settled,
                        data: None,
                        error: Some(failure),
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StubRateProvider;
    use crate::{CurrencyCode, DateRange};

    fn orchestrator(debounce_ms: u64) -> QueryOrchestrator {
        let client = RateFetchClient::new(Arc::new(StubRateProvider));
        QueryOrchestrator::new(client, Duration::from_millis(debounce_ms))
    }

    fn selection(codes: &[CurrencyCode]) -> FilterSelection {
        let range = DateRange::parse("2024-01-01", "2024-01-31").expect("valid range");
        FilterSelection::new(codes.to_vec(), range).expect("valid selection")
    }

    #[tokio::test]
    async fn starts_idle() {
        let orchestrator = orchestrator(10);
        let snapshot = orchestrator.snapshot();
        assert_eq!(snapshot.phase, QueryPhase::Idle);
        assert!(!snapshot.loading());
        assert!(snapshot.data.is_none());
    }

    #[tokio::test]
    async fn comparable_selection_settles_with_data() {
        let orchestrator = orchestrator(10);
        let mut updates = orchestrator.subscribe();
        orchestrator.set_filters(selection(&[CurrencyCode::Usd, CurrencyCode::Eur]));
        assert_eq!(orchestrator.snapshot().phase, QueryPhase::Debouncing);

        let settled = tokio::time::timeout(
            Duration::from_secs(1),
            updates.wait_for(|snapshot| snapshot.phase == QueryPhase::Settled),
        )
        .await
        .expect("should settle")
        .expect("sender alive")
        .clone();

        let data = settled.data.expect("data present");
        assert_eq!(data.base_currency, CurrencyCode::Usd);
        assert!(data.point_count > 0);
        assert!(settled.error.is_none());
    }

    #[tokio::test]
    async fn timer_for_an_earlier_filter_change_does_not_fetch() {
        let orchestrator = orchestrator(10_000);
        orchestrator.set_filters(selection(&[CurrencyCode::Usd, CurrencyCode::Eur]));
        let stale_epoch = orchestrator.inner.lock().debounce_epoch;
        orchestrator.set_filters(selection(&[CurrencyCode::Usd, CurrencyCode::Gbp]));

        // The first timer expires after the second change was made.
        Inner::debounce_elapsed(&orchestrator.inner, stale_epoch);

        assert_eq!(orchestrator.snapshot().phase, QueryPhase::Debouncing);
        assert!(orchestrator.inner.lock().in_flight.is_none());

        let current_epoch = orchestrator.inner.lock().debounce_epoch;
        Inner::debounce_elapsed(&orchestrator.inner, current_epoch);
        assert_eq!(orchestrator.snapshot().phase, QueryPhase::Fetching);
    }

    #[tokio::test]
    async fn disabling_forces_idle() {
        let orchestrator = orchestrator(10);
        orchestrator.set_filters(selection(&[CurrencyCode::Usd, CurrencyCode::Eur]));
        orchestrator.set_enabled(false);

        let snapshot = orchestrator.snapshot();
        assert_eq!(snapshot.phase, QueryPhase::Idle);
        assert!(snapshot.data.is_none());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(orchestrator.snapshot().phase, QueryPhase::Idle);
    }
}
