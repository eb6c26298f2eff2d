//! Local mirror of the report collection.
//!
//! The cache only ever changes through [`ReportCache::replace_all`], fed by
//! the live subscription. Workflow operations read from it but never write
//! to it; a mutation becomes visible once the store pushes the next snapshot.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::model::{Report, Status};

/// Cache handle shared between the snapshot listener and readers.
///
/// Never hold the guard across an `.await`.
pub type SharedCache = Arc<RwLock<ReportCache>>;

/// Per-status counters shown above the report list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub new: usize,
    pub in_progress: usize,
    pub done: usize,
}

impl StatusCounts {
    #[must_use]
    pub const fn get(&self, status: Status) -> usize {
        match status {
            Status::New => self.new,
            Status::InProgress => self.in_progress,
            Status::Done => self.done,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.new + self.in_progress + self.done
    }
}

#[derive(Debug, Default)]
pub struct ReportCache {
    reports: Vec<Report>,
    index: HashMap<String, usize>,
    generation: u64,
}

impl ReportCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shared() -> SharedCache {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Replace the whole collection with `snapshot`, keeping store order.
    ///
    /// If the snapshot repeats an id, lookups resolve to the first entry.
    pub fn replace_all(&mut self, snapshot: Vec<Report>) {
        let mut index = HashMap::with_capacity(snapshot.len());
        for (pos, report) in snapshot.iter().enumerate() {
            index.entry(report.id.clone()).or_insert(pos);
        }
        self.reports = snapshot;
        self.index = index;
        self.generation += 1;
        debug!(
            generation = self.generation,
            reports = self.reports.len(),
            "applied snapshot"
        );
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Report> {
        self.index.get(id).map(|&pos| &self.reports[pos])
    }

    /// Reports in store order (newest first).
    #[must_use]
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Number of snapshots applied so far; zero means still loading.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.generation > 0
    }

    #[must_use]
    pub fn stats(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for report in &self.reports {
            match report.status {
                Status::New => counts.new += 1,
                Status::InProgress => counts.in_progress += 1,
                Status::Done => counts.done += 1,
            }
        }
        counts
    }
}
