//! # Domain Models
//!
//! Canonical value types shared by the fetch client, the reshaping layer,
//! the orchestrator and the persisted stores.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CurrencyCode`] | Supported ISO currency code |
//! | [`CalendarDate`] | Date-only value in `YYYY-MM-DD` form |
//! | [`DateRange`] | Validated start/end window (max 2 years) |
//! | [`FilterSelection`] | Base + comparison currencies and a range |
//! | [`RatePoint`] | One observation for one pair |
//! | [`PairSeries`] | Raw per-pair fetch result |
//! | [`RateMatrix`] | Sparse date -> currency -> rate pivot |
//! | [`QueryResult`] | Published data value of a settled query |
//!
//! All types validate their invariants at construction time, including
//! when they are deserialized from persisted JSON.

mod currency;
mod date;
mod models;

pub use currency::CurrencyCode;
pub use date::{CalendarDate, DateRange};
pub use models::{
    FilterSelection, MatrixRow, PairSeries, QueryResult, RateMatrix, RatePoint, MAX_CURRENCIES,
};
