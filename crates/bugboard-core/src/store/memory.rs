//! In-process document store.
//!
//! Used by tests and demos. Every successful write pushes a fresh snapshot
//! to all live subscriptions. Two hooks let tests shape timing: fail the
//! next write, or hold writes until released.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;

use super::{
    Fanout, ReportStore, StoreError, StoreEvent, Subscription, generate_document_id,
    order_newest_first,
};
use crate::model::{NewReport, Report, ReportPatch};

/// A write call observed by the store, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Create(NewReport),
    Update { id: String, patch: ReportPatch },
}

#[derive(Debug, Default)]
struct Inner {
    reports: Vec<Report>,
    calls: Vec<StoreCall>,
    fail_next: Option<StoreError>,
    hold: Option<Arc<Notify>>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fanout: Fanout,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with existing documents (ids are kept as given).
    #[must_use]
    pub fn with_reports(reports: Vec<Report>) -> Self {
        let store = Self::new();
        store.inner.lock().reports = reports;
        store
    }

    /// Current collection, newest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Report> {
        let mut reports = self.inner.lock().reports.clone();
        order_newest_first(&mut reports);
        reports
    }

    /// Every write call received so far, including failed ones.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().calls.clone()
    }

    /// Make the next create/update fail with `err` without changing data.
    pub fn fail_next(&self, err: StoreError) {
        self.inner.lock().fail_next = Some(err);
    }

    /// Park subsequent writes until the returned handle is notified.
    ///
    /// Each `notify_one` releases one parked write.
    #[must_use]
    pub fn hold_writes(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.inner.lock().hold = Some(Arc::clone(&notify));
        notify
    }

    pub fn release_writes(&self) {
        if let Some(hold) = self.inner.lock().hold.take() {
            hold.notify_waiters();
        }
    }

    /// Push an error event to every subscriber, as a broken connection would.
    pub fn emit_error(&self, message: impl Into<String>) {
        self.fanout.broadcast(&StoreEvent::Error(message.into()));
    }

    /// Number of subscriptions that are still being delivered to.
    #[must_use]
    pub fn live_subscriptions(&self) -> usize {
        self.fanout.live()
    }

    async fn wait_if_held(&self) {
        let hold = self.inner.lock().hold.clone();
        if let Some(hold) = hold {
            hold.notified().await;
        }
    }

    fn take_failure(&self, call: StoreCall) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.calls.push(call);
        inner.fail_next.take().map_or(Ok(()), Err)
    }

    fn publish(&self) {
        self.fanout.broadcast(&StoreEvent::Snapshot(self.snapshot()));
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    fn subscribe(&self) -> Subscription {
        self.fanout.register(StoreEvent::Snapshot(self.snapshot()))
    }

    async fn create(&self, report: NewReport) -> Result<String, StoreError> {
        self.wait_if_held().await;
        self.take_failure(StoreCall::Create(report.clone()))?;

        let id = generate_document_id();
        debug!(id = %id, "memory store: create");
        self.inner.lock().reports.push(Report::from_new(id.clone(), report));
        self.publish();
        Ok(id)
    }

    async fn update(&self, id: &str, patch: ReportPatch) -> Result<(), StoreError> {
        self.wait_if_held().await;
        self.take_failure(StoreCall::Update {
            id: id.to_string(),
            patch: patch.clone(),
        })?;

        {
            let mut inner = self.inner.lock();
            let report = inner
                .reports
                .iter_mut()
                .find(|report| report.id == id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            report.apply_patch(&patch);
        }
        debug!(id = %id, "memory store: update");
        self.publish();
        Ok(())
    }
}
