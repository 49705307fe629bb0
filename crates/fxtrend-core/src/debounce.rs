//! Trailing-edge debounce timer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Delays an action until calls to [`Debouncer::schedule`] have been quiet
/// for `delay`. Only the most recently scheduled action can ever run.
///
/// Must be used from within a Tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    ticket: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ticket: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Restart the timer; `action` runs after the delay unless superseded.
    pub fn schedule<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let ticket = self.ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let current = Arc::clone(&self.ticket);
        let delay = self.delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // A later schedule/cancel bumped the ticket: this timer is stale.
            if current.load(Ordering::SeqCst) == ticket {
                action();
            }
        });

        let previous = self
            .pending
            .lock()
            .expect("debouncer lock is not poisoned")
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Drop the pending action, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        self.ticket.fetch_add(1, Ordering::SeqCst);
        let previous = self
            .pending
            .lock()
            .expect("debouncer lock is not poisoned")
            .take();
        match previous {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                was_pending
            }
            None => false,
        }
    }

    /// Cancel the pending timer and run `action` immediately.
    pub fn fire_now<F>(&self, action: F)
    where
        F: FnOnce(),
    {
        self.cancel();
        action();
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .expect("debouncer lock is not poisoned")
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let count = Arc::new(AtomicUsize::new(0));
        let make = {
            let count = Arc::clone(&count);
            move || {
                let count = Arc::clone(&count);
                Box::new(move || {
                    count.fetch_add(1, Ordering::SeqCst);
                }) as Box<dyn FnOnce() + Send>
            }
        };
        (count, make)
    }

    #[tokio::test]
    async fn burst_of_schedules_fires_once_on_trailing_edge() {
        let debouncer = Debouncer::new(Duration::from_millis(40));
        let (count, action) = counter();

        for _ in 0..5 {
            debouncer.schedule(action());
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 0, "no leading-edge fire");

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test]
    async fn cancel_prevents_the_action() {
        let debouncer = Debouncer::new(Duration::from_millis(20));
        let (count, action) = counter();

        debouncer.schedule(action());
        assert!(debouncer.is_pending());
        assert!(debouncer.cancel());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fire_now_runs_immediately_and_drops_pending_timer() {
        let debouncer = Debouncer::new(Duration::from_millis(20));
        let (count, action) = counter();

        debouncer.schedule(action());
        debouncer.fire_now(action());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
