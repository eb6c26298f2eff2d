//! Wiring of store, cache, sync task, controller and session for a front end.

use std::sync::Arc;

use crate::cache::ReportCache;
use crate::error::BoardError;
use crate::model::Status;
use crate::session::BoardSession;
use crate::store::ReportStore;
use crate::sync::{SnapshotSync, SyncState};
use crate::workflow::{NoteTemplates, Outcome, SkipReason, WorkflowController};

#[derive(Debug, Clone, Default)]
pub struct BoardOptions {
    pub templates: NoteTemplates,
    pub author: Option<String>,
}

/// One open board: a live subscription feeding the cache, and the
/// controller and session reading from it.
pub struct Board<S: ReportStore + ?Sized> {
    controller: WorkflowController<S>,
    session: BoardSession,
    sync: SnapshotSync,
}

impl<S: ReportStore + ?Sized> Board<S> {
    /// Subscribe to `store` and start mirroring it. Needs a tokio runtime.
    #[must_use]
    pub fn open(store: Arc<S>, options: BoardOptions) -> Self {
        let cache = ReportCache::shared();
        let sync = SnapshotSync::start(store.subscribe(), Arc::clone(&cache));
        let controller = WorkflowController::new(store, Arc::clone(&cache))
            .with_templates(options.templates)
            .with_author(options.author);
        let session = BoardSession::new(cache, controller.in_flight().clone());
        Self {
            controller,
            session,
            sync,
        }
    }

    #[must_use]
    pub const fn controller(&self) -> &WorkflowController<S> {
        &self.controller
    }

    #[must_use]
    pub const fn session(&self) -> &BoardSession {
        &self.session
    }

    pub const fn session_mut(&mut self) -> &mut BoardSession {
        &mut self.session
    }

    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        self.sync.state()
    }

    #[must_use]
    pub fn watch(&self) -> tokio::sync::watch::Receiver<SyncState> {
        self.sync.watch()
    }

    /// Wait for the first snapshot.
    pub async fn ready(&mut self) -> Result<SyncState, BoardError> {
        self.sync.wait_for_generation(1).await
    }

    /// Wait for a snapshot newer than `generation`, e.g. the one confirming
    /// a write issued after `generation` was observed.
    ///
    /// Subscription errors in between do not fail the wait, since the write
    /// itself already succeeded. Bound it with a timeout.
    pub async fn settle(&mut self, generation: u64) -> Result<SyncState, BoardError> {
        self.sync.wait_past_errors(generation + 1).await
    }

    fn selected(&self) -> Option<String> {
        self.session.selected_id().map(ToString::to_string)
    }

    pub async fn append_note_to_selected(&self, text: &str) -> Result<Outcome, BoardError> {
        let Some(id) = self.selected() else {
            return Ok(Outcome::Skipped(SkipReason::NothingSelected));
        };
        self.controller.append_note(&id, text).await
    }

    pub async fn set_selected_status(&self, target: Status) -> Result<Outcome, BoardError> {
        let Some(id) = self.selected() else {
            return Ok(Outcome::Skipped(SkipReason::NothingSelected));
        };
        self.controller.transition_to(&id, target).await
    }

    pub async fn mark_selected_done(&self) -> Result<Outcome, BoardError> {
        let Some(id) = self.selected() else {
            return Ok(Outcome::Skipped(SkipReason::NothingSelected));
        };
        self.controller.mark_done(&id).await
    }

    /// Unsubscribe and drop the board.
    pub fn close(self) {
        self.sync.stop();
    }
}
