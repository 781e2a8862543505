//! Change Notifier
//!
//! Forwards every storage event of an area to application callbacks. There is
//! no filtering by key and no debouncing.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::storage::{StorageBackend, StorageEvent};

/// An active change subscription.
///
/// Dropping it keeps the callback registered; call [`Subscription::unsubscribe`]
/// to stop forwarding.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    /// Stops forwarding events to the callback.
    pub fn unsubscribe(self) {
        self.task.abort();
    }

    /// Returns true while events are still being forwarded.
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

// == Change Notifier ==
/// Subscribes callbacks to a backend's change stream.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    backend: Arc<dyn StorageBackend>,
    runtime: Option<Handle>,
}

impl ChangeNotifier {
    /// Creates a notifier for `backend`, delivering callbacks on `runtime`.
    pub fn new(backend: Arc<dyn StorageBackend>, runtime: Option<Handle>) -> Self {
        Self { backend, runtime }
    }

    /// Invokes `callback` for every subsequent change to the storage area.
    pub fn on_change<F>(&self, mut callback: F) -> Result<Subscription>
    where
        F: FnMut(StorageEvent) + Send + 'static,
    {
        let runtime = self.runtime.as_ref().ok_or_else(|| {
            CacheError::Unavailable("no runtime to deliver change events on".to_string())
        })?;

        // Subscribe before spawning so no event after this call is missed
        let mut rx = self.backend.subscribe();
        let area = self.backend.area();
        let task = runtime.spawn(async move {
            while let Some(event) = rx.recv().await {
                callback(event);
            }
            debug!("Change listener on {} area stopped", area);
        });

        Ok(Subscription { task })
    }
}
