use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::backend::{StorageBackend, StorageEvent, StoreId, EVENT_CAPACITY};
use crate::PersistenceError;

/// Default interval between checks for writes made by other processes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Storage under a directory, one `<key>.json` file per key.
///
/// Writes go to a temporary file that is renamed over the target, so readers
/// never observe a partial value. Changes made by other processes are only
/// seen through [`FileStorage::poll_changes`] or a watcher task.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
    events: broadcast::Sender<StorageEvent>,
    // Last contents seen per key, for change detection.
    known: Mutex<HashMap<String, Option<String>>>,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            dir: dir.into(),
            events,
            known: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }

    fn read_file(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Io {
                key: key.to_owned(),
                source,
            }),
        }
    }

    fn remember(&self, key: &str, value: Option<String>) {
        self.known
            .lock()
            .expect("file storage lock is not poisoned")
            .insert(key.to_owned(), value);
    }

    /// Re-read every key this storage has touched and broadcast the ones
    /// whose contents changed behind its back.
    pub fn poll_changes(&self) -> Vec<StorageEvent> {
        let keys: Vec<String> = self
            .known
            .lock()
            .expect("file storage lock is not poisoned")
            .keys()
            .cloned()
            .collect();

        let mut changed = Vec::new();
        for key in keys {
            let current = match self.read_file(&key) {
                Ok(current) => current,
                Err(error) => {
                    warn!(%key, %error, "failed to poll storage key");
                    continue;
                }
            };

            let mut known = self.known.lock().expect("file storage lock is not poisoned");
            if known.get(&key) == Some(&current) {
                continue;
            }
            known.insert(key.clone(), current.clone());
            drop(known);

            debug!(%key, "external storage change");
            changed.push(StorageEvent {
                key,
                value: current,
                origin: StoreId::EXTERNAL,
            });
        }

        for event in &changed {
            let _ = self.events.send(event.clone());
        }
        changed
    }

    /// Poll for external changes every `interval` until the storage is dropped.
    pub fn spawn_watcher(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(storage) = weak.upgrade() else {
                    break;
                };
                storage.poll_changes();
            }
        })
    }
}

impl StorageBackend for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let value = self.read_file(key)?;
        self.remember(key, value.clone());
        Ok(value)
    }

    fn write(&self, key: &str, value: &str, origin: StoreId) -> Result<(), PersistenceError> {
        let io_error = |source| PersistenceError::Io {
            key: key.to_owned(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_error)?;
        let target = self.path_for(key);
        let staging = target.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
        fs::write(&staging, value).map_err(io_error)?;
        if let Err(source) = fs::rename(&staging, &target) {
            let _ = fs::remove_file(&staging);
            return Err(io_error(source));
        }

        self.remember(key, Some(value.to_owned()));
        let _ = self.events.send(StorageEvent {
            key: key.to_owned(),
            value: Some(value.to_owned()),
            origin,
        });
        Ok(())
    }

    fn remove(&self, key: &str, origin: StoreId) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => {}
            Err(error) if error.kind() == ErrorKind::NotFound => {
                self.remember(key, None);
                return Ok(());
            }
            Err(source) => {
                return Err(PersistenceError::Io {
                    key: key.to_owned(),
                    source,
                })
            }
        }

        self.remember(key, None);
        let _ = self.events.send(StorageEvent {
            key: key.to_owned(),
            value: None,
            origin,
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}
