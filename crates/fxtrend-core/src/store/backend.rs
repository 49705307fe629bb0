use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::PersistenceError;

/// Identity of a store instance (one per open view, like a browser tab).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreId(Uuid);

impl StoreId {
    /// Origin used for changes observed from outside this process.
    pub const EXTERNAL: Self = Self(Uuid::nil());

    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn is_external(self) -> bool {
        self == Self::EXTERNAL
    }
}

impl Default for StoreId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for StoreId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_external() {
            f.write_str("external")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Notification that a key changed. `value` is `None` when it was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub value: Option<String>,
    pub origin: StoreId,
}

/// Capacity of the change-event channel of each backend.
pub(crate) const EVENT_CAPACITY: usize = 64;

/// Durable key/value text storage shared by every store instance.
///
/// Writes are last-write-wins with no locking across instances. Each write
/// is broadcast to subscribers tagged with the writer's [`StoreId`].
pub trait StorageBackend: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    fn write(&self, key: &str, value: &str, origin: StoreId) -> Result<(), PersistenceError>;

    fn remove(&self, key: &str, origin: StoreId) -> Result<(), PersistenceError>;

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}
