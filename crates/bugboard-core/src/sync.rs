//! Background task that drains a store subscription into the shared cache.
//!
//! Snapshots may land at any point, including while a workflow mutation is
//! waiting on the store. Each one is a full replacement, applied in
//! delivery order.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::SharedCache;
use crate::error::BoardError;
use crate::store::{StoreEvent, Subscription};

/// Progress of the live subscription, published after every event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    /// Snapshots applied to the cache so far.
    pub generation: u64,
    /// Error events received so far.
    pub errors: u64,
    /// Most recent error, cleared by the next good snapshot.
    pub last_error: Option<String>,
    /// The store side ended the subscription.
    pub closed: bool,
}

impl SyncState {
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.generation > 0
    }
}

/// Apply one subscription event to the cache and the published state.
pub fn apply_event(cache: &SharedCache, state: &mut SyncState, event: StoreEvent) {
    match event {
        StoreEvent::Snapshot(reports) => {
            let mut cache = cache.write();
            cache.replace_all(reports);
            state.generation = cache.generation();
            state.last_error = None;
        }
        StoreEvent::Error(message) => {
            warn!(error = %message, "report subscription error");
            state.errors += 1;
            state.last_error = Some(message);
        }
    }
}

/// Owns the listener task. Dropping it unsubscribes.
#[derive(Debug)]
pub struct SnapshotSync {
    task: JoinHandle<()>,
    state: watch::Receiver<SyncState>,
}

impl SnapshotSync {
    /// Spawn the listener. Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(mut subscription: Subscription, cache: SharedCache) -> Self {
        let (tx, state) = watch::channel(SyncState::default());
        let task = tokio::spawn(async move {
            while let Some(event) = subscription.next_event().await {
                tx.send_modify(|state| apply_event(&cache, state, event));
            }
            debug!("report subscription ended");
            tx.send_modify(|state| state.closed = true);
        });
        Self { task, state }
    }

    #[must_use]
    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Another receiver for views that re-render on every change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SyncState> {
        self.state.clone()
    }

    /// Wait until at least `min` snapshots have been applied.
    ///
    /// Fails if the subscription reports an error or ends first.
    pub async fn wait_for_generation(&mut self, min: u64) -> Result<SyncState, BoardError> {
        self.wait(min, true).await
    }

    /// Wait until at least `min` snapshots have been applied, riding out
    /// error events. Fails only if the subscription ends.
    ///
    /// This never returns while the store keeps failing, so callers bound
    /// it with a timeout.
    pub async fn wait_past_errors(&mut self, min: u64) -> Result<SyncState, BoardError> {
        self.wait(min, false).await
    }

    async fn wait(&mut self, min: u64, fail_on_error: bool) -> Result<SyncState, BoardError> {
        let errors_at_start = self.state.borrow().errors;
        loop {
            {
                let state = self.state.borrow_and_update();
                if state.generation >= min {
                    return Ok(state.clone());
                }
                if fail_on_error && state.errors > errors_at_start {
                    let message = state.last_error.clone().unwrap_or_default();
                    return Err(BoardError::Transport(message));
                }
                if state.closed {
                    return Err(BoardError::Transport("report subscription closed".into()));
                }
            }
            if self.state.changed().await.is_err() {
                return Err(BoardError::Transport("report subscription closed".into()));
            }
        }
    }

    /// Stop listening. Same as dropping.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for SnapshotSync {
    fn drop(&mut self) {
        self.task.abort();
    }
}
