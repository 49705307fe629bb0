//! Rate provider adapters.
//!
//! | Adapter | Transport |
//! |---------|-----------|
//! | [`FrankfurterProvider`] | Frankfurter public API, one call per base/range group |
//! | [`BackendProvider`] | `fxtrend-server` batch endpoint |
//! | [`StubRateProvider`] | In-process deterministic data, no network |

mod backend;
mod frankfurter;
mod stub;

pub use backend::{BackendProvider, BATCH_RATES_PATH};
pub use frankfurter::{FrankfurterProvider, FrankfurterQuery, FRANKFURTER_API_URL};
pub use stub::StubRateProvider;
