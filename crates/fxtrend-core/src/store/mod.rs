//! Persisted view state shared across concurrently open views.
//!
//! A [`PersistedStore`] keeps one JSON value under a fixed key in a
//! [`StorageBackend`]. Every store instance has its own [`StoreId`]; a write
//! is broadcast with that id so other instances pick it up while the writer
//! ignores its own echo.
//!
//! Persistence failures never reach the caller: the in-memory value stays
//! authoritative and the failure is logged.

mod backend;
mod file;
mod memory;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub use backend::{StorageBackend, StorageEvent, StoreId};
pub use file::{FileStorage, DEFAULT_POLL_INTERVAL};
pub use memory::MemoryStorage;

use crate::grid::GridState;
use crate::{FilterSelection, PersistenceError};

/// Storage key of the dashboard filter selection.
pub const FILTERS_KEY: &str = "currency-dashboard-filters";

/// Storage key of the rate grid's sort and pagination state.
pub const GRID_STATE_KEY: &str = "currency-dashboard-grid-state";

struct StoreInner<T> {
    id: StoreId,
    key: String,
    default: T,
    backend: Arc<dyn StorageBackend>,
    value: watch::Sender<T>,
}

/// One view's handle on a persisted value.
pub struct PersistedStore<T> {
    inner: Arc<StoreInner<T>>,
}

impl<T> Clone for PersistedStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> PersistedStore<T>
where
    T: Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync + 'static,
{
    /// Load the stored value, falling back to `default` when it is absent,
    /// unreadable, or does not decode into a valid `T`.
    pub fn open(backend: Arc<dyn StorageBackend>, key: impl Into<String>, default: T) -> Self {
        let key = key.into();
        let initial = match load(backend.as_ref(), &key) {
            Ok(Some(value)) => value,
            Ok(None) => default.clone(),
            Err(error) => {
                warn!(%key, %error, "ignoring stored value");
                default.clone()
            }
        };

        let (value, _) = watch::channel(initial);
        Self {
            inner: Arc::new(StoreInner {
                id: StoreId::new(),
                key,
                default,
                backend,
                value,
            }),
        }
    }

    pub fn id(&self) -> StoreId {
        self.inner.id
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Change notifications; the receiver starts at the current value.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.inner.value.subscribe()
    }

    pub fn set(&self, value: T) {
        self.inner.value.send_replace(value.clone());
        self.persist(&value);
    }

    /// Derive the next value from the current one.
    pub fn update(&self, next: impl FnOnce(&T) -> T) {
        let mut updated = None;
        self.inner.value.send_modify(|current| {
            let value = next(current);
            *current = value.clone();
            updated = Some(value);
        });
        if let Some(value) = updated {
            self.persist(&value);
        }
    }

    /// Restore the default and drop the stored entry.
    pub fn reset(&self) {
        self.inner.value.send_replace(self.inner.default.clone());
        if let Err(error) = self.inner.backend.remove(&self.inner.key, self.inner.id) {
            warn!(key = %self.inner.key, %error, "failed to clear stored value");
        }
    }

    /// Adopt a change announced by the backend.
    ///
    /// Events for other keys or from this store itself are ignored, as are
    /// values that do not decode. A removal reverts to the default. Returns
    /// whether the in-memory value changed.
    pub fn apply_external(&self, event: &StorageEvent) -> bool {
        if event.key != self.inner.key || event.origin == self.inner.id {
            return false;
        }

        let next = match &event.value {
            None => self.inner.default.clone(),
            Some(raw) => match serde_json::from_str::<T>(raw) {
                Ok(value) => value,
                Err(error) => {
                    warn!(key = %event.key, origin = %event.origin, %error, "ignoring malformed external value");
                    return false;
                }
            },
        };

        let changed = self.inner.value.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        if changed {
            debug!(key = %event.key, origin = %event.origin, "adopted external value");
        }
        changed
    }

    /// Apply backend events in the background until every handle on this
    /// store is dropped.
    pub fn spawn_sync(&self) -> JoinHandle<()> {
        let mut events = self.inner.backend.subscribe();
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let Some(inner) = weak.upgrade() else {
                            break;
                        };
                        PersistedStore { inner }.apply_external(&event);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "storage events lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    fn persist(&self, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(|source| PersistenceError::Serialize {
                key: self.inner.key.clone(),
                source,
            })
            .and_then(|raw| self.inner.backend.write(&self.inner.key, &raw, self.inner.id));
        if let Err(error) = result {
            warn!(key = %self.inner.key, %error, "failed to persist value; keeping in-memory state");
        }
    }
}

fn load<T: DeserializeOwned>(
    backend: &dyn StorageBackend,
    key: &str,
) -> Result<Option<T>, PersistenceError> {
    let Some(raw) = backend.read(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| PersistenceError::Malformed {
            key: key.to_owned(),
            source,
        })
}

/// Filter store with the empty default selection.
pub fn open_filters(backend: Arc<dyn StorageBackend>) -> PersistedStore<FilterSelection> {
    PersistedStore::open(backend, FILTERS_KEY, FilterSelection::default())
}

/// Grid state store with the default sort and page.
pub fn open_grid_state(backend: Arc<dyn StorageBackend>) -> PersistedStore<GridState> {
    PersistedStore::open(backend, GRID_STATE_KEY, GridState::default())
}
