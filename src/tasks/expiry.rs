//! Expiry Timers
//!
//! One-shot deferred erase of a single key.
//!
//! Timers are independent: arming twice for the same key schedules two timers
//! and both fire. The engine never cancels a timer; [`TimerHandle::cancel`] is
//! available to callers that hold the handle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

// == Timer Handle ==
/// A pending expiry timer.
///
/// Dropping the handle leaves the timer running.
#[derive(Debug)]
pub struct TimerHandle {
    key: String,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Key this timer will erase.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stops the timer if it has not fired yet.
    pub fn cancel(self) {
        debug!("Expiry timer for {} cancelled", self.key);
        self.task.abort();
    }

    /// Returns true once the timer has fired or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Keeps the pending count accurate whether the timer fires, is cancelled,
/// or is dropped with its runtime.
struct PendingGuard(Arc<AtomicUsize>);

impl PendingGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// == Expiry Scheduler ==
/// Schedules deferred erase actions on a tokio runtime.
#[derive(Debug, Clone)]
pub struct ExpiryScheduler {
    runtime: Option<Handle>,
    pending: Arc<AtomicUsize>,
}

impl ExpiryScheduler {
    /// Creates a scheduler bound to `runtime`. With `None`, arming is a no-op.
    pub fn new(runtime: Option<Handle>) -> Self {
        Self {
            runtime,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Creates a scheduler bound to the runtime of the calling context, if any.
    pub fn current() -> Self {
        Self::new(Handle::try_current().ok())
    }

    /// Returns true if timers can be scheduled.
    pub fn is_available(&self) -> bool {
        self.runtime.is_some()
    }

    /// Number of timers armed and not yet finished.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    // == Arm ==
    /// Runs `on_expire(key)` once `delay` has elapsed.
    ///
    /// Returns `None` when no runtime is available.
    pub fn arm<F>(&self, key: &str, delay: Duration, on_expire: F) -> Option<TimerHandle>
    where
        F: FnOnce(String) + Send + 'static,
    {
        let Some(runtime) = &self.runtime else {
            warn!("No timer runtime available, {} will not expire", key);
            return None;
        };

        let guard = PendingGuard::new(self.pending.clone());
        let owned_key = key.to_string();
        let task = runtime.spawn(async move {
            let _guard = guard;
            tokio::time::sleep(delay).await;
            debug!("Expiry timer fired for {}", owned_key);
            on_expire(owned_key);
        });

        debug!("Armed expiry timer for {} in {:?}", key, delay);
        Some(TimerHandle {
            key: key.to_string(),
            task,
        })
    }
}
