//! Remote store adapter contract and the bundled adapters.
//!
//! The core only talks to a store through [`ReportStore`]: one live
//! subscription delivering whole-collection snapshots, plus create and
//! partial-update calls.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use futures::Stream;
use parking_lot::Mutex;
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

use crate::model::{NewReport, Report, ReportPatch};

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Errors returned by store calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Transport(String),

    #[error("no report with id {0}")]
    NotFound(String),
}

/// One delivery on a live subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Full collection, newest first.
    Snapshot(Vec<Report>),
    /// Delivery failed; the previous snapshot is still the latest known state.
    Error(String),
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Start a live listener. The first event is the current collection.
    ///
    /// Failures are delivered as [`StoreEvent::Error`] rather than returned.
    /// Must be called from within a tokio runtime.
    fn subscribe(&self) -> Subscription;

    /// Create a report and return its store-assigned id.
    async fn create(&self, report: NewReport) -> Result<String, StoreError>;

    /// Overwrite the fields present in `patch` on report `id`.
    async fn update(&self, id: &str, patch: ReportPatch) -> Result<(), StoreError>;
}

/// Cancellable stream of [`StoreEvent`]s.
///
/// Delivery stops when the subscription is dropped or [`unsubscribe`]d.
///
/// [`unsubscribe`]: Subscription::unsubscribe
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<StoreEvent>,
}

impl Subscription {
    /// Create a connected sender/subscription pair.
    #[must_use]
    pub fn channel() -> (mpsc::UnboundedSender<StoreEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// Wait for the next event. `None` once the store side has gone away.
    pub async fn next_event(&mut self) -> Option<StoreEvent> {
        self.rx.recv().await
    }

    pub fn unsubscribe(mut self) {
        self.rx.close();
    }
}

impl Stream for Subscription {
    type Item = StoreEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Live subscriber list for adapters that push on every write.
#[derive(Debug, Default)]
pub(crate) struct Fanout {
    senders: Mutex<Vec<mpsc::UnboundedSender<StoreEvent>>>,
}

impl Fanout {
    /// Register a subscriber and hand it `initial` as its first event.
    pub(crate) fn register(&self, initial: StoreEvent) -> Subscription {
        let (tx, subscription) = Subscription::channel();
        if tx.send(initial).is_ok() {
            self.senders.lock().push(tx);
        }
        subscription
    }

    /// Deliver `event` to every live subscriber, pruning closed ones.
    pub(crate) fn broadcast(&self, event: &StoreEvent) {
        self.senders
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub(crate) fn live(&self) -> usize {
        let mut senders = self.senders.lock();
        senders.retain(|tx| !tx.is_closed());
        senders.len()
    }
}

const GENERATED_ID_LEN: usize = 20;

/// Random alphanumeric id in the style document stores assign.
#[must_use]
pub fn generate_document_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_ID_LEN)
        .map(char::from)
        .collect()
}

/// Sort a collection the way the subscription delivers it: newest first.
pub(crate) fn order_newest_first(reports: &mut [Report]) {
    reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
