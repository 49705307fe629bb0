//! # fxtrend Core
//!
//! Core contracts, request lifecycle and persisted state for the fxtrend
//! exchange-rate dashboard.
//!
//! ## Overview
//!
//! This crate provides the headless core of the dashboard:
//!
//! - **Domain types** for currencies, calendar dates, ranges and filter selections
//! - **Rate providers** behind one batch lookup trait (Frankfurter, a batch proxy, a stub)
//! - **Fetch client** that pivots per-pair series into a date-indexed matrix
//! - **Query orchestration** with debouncing, cancellation and stale-response protection
//! - **Persisted stores** that survive restarts and resync between open views
//! - **Grid view-model** for sorting and paginating the matrix
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Frankfurter, batch proxy, stub) |
//! | [`cancel`] | Cancellation token for in-flight requests |
//! | [`config`] | Environment-driven dashboard configuration |
//! | [`date_range`] | Default range, range bounds and validation |
//! | [`debounce`] | Trailing-edge debounce timer |
//! | [`domain`] | Domain models (CurrencyCode, DateRange, RateMatrix) |
//! | [`error`] | Core error types |
//! | [`fetch_client`] | Batch fetch and reshape into a [`QueryResult`] |
//! | [`grid`] | Sortable, paginated grid view |
//! | [`http_client`] | HTTP client abstraction |
//! | [`orchestrator`] | Query lifecycle state machine |
//! | [`provider`] | Rate provider trait and batch wire types |
//! | [`reshape`] | Pair series to matrix pivot and chart series |
//! | [`store`] | Persisted values with cross-view sync |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fxtrend_core::{
//!     CancelToken, CurrencyCode, DateRange, FrankfurterProvider, RateFetchClient,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RateFetchClient::new(Arc::new(FrankfurterProvider::default()));
//!     let range = DateRange::parse("2024-01-01", "2024-03-31")?;
//!
//!     let outcome = client
//!         .fetch_pairs(CurrencyCode::Usd, &[CurrencyCode::Eur], &range, &CancelToken::new())
//!         .await?;
//!
//!     if let Some(result) = outcome.into_result() {
//!         println!("{} dates", result.point_count);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Persisted Store │────▶│ Storage Backend  │
//! └────────┬────────┘     │ (memory / files) │
//!          │ filters      └──────────────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Orchestrator    │────▶│ Debouncer        │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Rate Fetch      │────▶│ Rate Provider    │
//! │ Client          │     │ (Adapter Trait)  │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       ▼
//!          ▼              ┌──────────────────┐
//! ┌─────────────────┐     │ HTTP Client      │
//! │ RateMatrix      │     │ (reqwest)        │
//! │ (chart / grid)  │     └──────────────────┘
//! └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Fetches fail with a [`FetchFailure`] that carries its classification:
//!
//! ```rust
//! use fxtrend_core::{FetchFailure, FetchFailureKind};
//!
//! fn describe(failure: &FetchFailure) -> &'static str {
//!     match failure.kind() {
//!         FetchFailureKind::Timeout => "the provider took too long",
//!         FetchFailureKind::Provider => "the provider rejected the request",
//!         FetchFailureKind::Transport => "the provider could not be reached",
//!         FetchFailureKind::Decode => "the provider sent an unexpected payload",
//!     }
//! }
//! ```
//!
//! Cancellation is not an error; it surfaces as [`FetchOutcome::Cancelled`].

pub mod adapters;
pub mod cancel;
pub mod config;
pub mod date_range;
pub mod debounce;
pub mod domain;
pub mod error;
pub mod fetch_client;
pub mod grid;
pub mod http_client;
pub mod orchestrator;
pub mod provider;
pub mod reshape;
pub mod store;

// Re-export commonly used types at crate root for convenience

// Adapter implementations
pub use adapters::{
    BackendProvider, FrankfurterProvider, FrankfurterQuery, StubRateProvider, BATCH_RATES_PATH,
    FRANKFURTER_API_URL,
};

pub use cancel::CancelToken;
pub use config::DashboardConfig;

// Date range rules
pub use date_range::{
    default_range, default_range_on, display_format, is_valid_range, max_start_date,
    validate_range, MAX_RANGE_DAYS, MAX_RANGE_YEARS,
};

pub use debounce::Debouncer;

// Domain models
pub use domain::{
    CalendarDate, CurrencyCode, DateRange, FilterSelection, MatrixRow, PairSeries, QueryResult,
    RateMatrix, RatePoint, MAX_CURRENCIES,
};

// Error types
pub use error::{FetchFailure, FetchFailureKind, PersistenceError, ValidationError};

pub use fetch_client::{FetchOutcome, RateFetchClient, DEFAULT_REQUEST_TIMEOUT};

// Grid view
pub use grid::{
    GridColumn, GridPage, GridRow, GridState, GridView, SortDirection, SortSpec, PAGE_SIZES,
};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpMethod, HttpRequest, HttpResponse,
    ReqwestHttpClient,
};

// Query lifecycle
pub use orchestrator::{QueryOrchestrator, QueryPhase, QuerySnapshot, DEFAULT_DEBOUNCE};

// Provider contract
pub use provider::{
    BatchRateRequest, BatchRateResponse, PairRequest, PairResult, RateProvider,
};

pub use reshape::{build_matrix, chart_series, ChartSeries};

// Persisted stores
pub use store::{
    open_filters, open_grid_state, FileStorage, MemoryStorage, PersistedStore, StorageBackend,
    StorageEvent, StoreId, DEFAULT_POLL_INTERVAL, FILTERS_KEY, GRID_STATE_KEY,
};
