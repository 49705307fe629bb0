use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;

use super::backend::{StorageBackend, StorageEvent, StoreId, EVENT_CAPACITY};
use crate::PersistenceError;

/// In-process storage with an optional byte quota over all stored values.
#[derive(Debug)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
    events: broadcast::Sender<StorageEvent>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: Mutex::new(HashMap::new()),
            quota: None,
            events,
        }
    }

    /// Reject writes that would push the total stored bytes above `quota`.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::new()
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("memory storage lock is not poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageBackend for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self
            .entries
            .lock()
            .expect("memory storage lock is not poisoned")
            .get(key)
            .cloned())
    }

    fn write(&self, key: &str, value: &str, origin: StoreId) -> Result<(), PersistenceError> {
        {
            let mut entries = self
                .entries
                .lock()
                .expect("memory storage lock is not poisoned");

            if let Some(quota) = self.quota {
                let others: usize = entries
                    .iter()
                    .filter(|(existing, _)| existing.as_str() != key)
                    .map(|(_, stored)| stored.len())
                    .sum();
                if others + value.len() > quota {
                    return Err(PersistenceError::QuotaExceeded {
                        key: key.to_owned(),
                        len: value.len(),
                        quota,
                    });
                }
            }

            entries.insert(key.to_owned(), value.to_owned());
        }

        // No subscribers is fine.
        let _ = self.events.send(StorageEvent {
            key: key.to_owned(),
            value: Some(value.to_owned()),
            origin,
        });
        Ok(())
    }

    fn remove(&self, key: &str, origin: StoreId) -> Result<(), PersistenceError> {
        let removed = self
            .entries
            .lock()
            .expect("memory storage lock is not poisoned")
            .remove(key);
        if removed.is_some() {
            let _ = self.events.send(StorageEvent {
                key: key.to_owned(),
                value: None,
                origin,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}
