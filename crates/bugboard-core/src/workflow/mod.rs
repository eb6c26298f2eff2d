//! Report workflow: create, append note, status transitions.
//!
//! Every operation follows the same order: validate input, take the
//! in-flight flag (a busy controller turns the call into a no-op), plan the
//! effect from the cached state, then issue the single remote call. The
//! cache is never written here; callers see the result when the store
//! pushes its next snapshot.

pub mod guard;
pub mod plan;
pub mod transition;

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::SharedCache;
use crate::error::BoardError;
use crate::model::{NewReport, ReportPatch, Status};
use crate::store::ReportStore;

pub use guard::{InFlight, InFlightGuard};
pub use plan::{Effect, NoteTemplates, PlanContext, ReportDraft};

/// Why an operation finished without calling the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another mutation held the in-flight flag.
    Busy,
    /// The report already has the requested status.
    AlreadyInStatus(Status),
    /// A selection-based action ran with no report selected.
    NothingSelected,
}

/// What a successful operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created { id: String, report: NewReport },
    Updated { id: String, patch: ReportPatch },
    Skipped(SkipReason),
}

impl Outcome {
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

pub struct WorkflowController<S: ReportStore + ?Sized> {
    store: Arc<S>,
    cache: SharedCache,
    in_flight: InFlight,
    templates: NoteTemplates,
    author: Option<String>,
}

impl<S: ReportStore + ?Sized> WorkflowController<S> {
    #[must_use]
    pub fn new(store: Arc<S>, cache: SharedCache) -> Self {
        Self {
            store,
            cache,
            in_flight: InFlight::new(),
            templates: NoteTemplates::default(),
            author: None,
        }
    }

    #[must_use]
    pub fn with_templates(mut self, templates: NoteTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Stamp `author` on every note this controller writes.
    #[must_use]
    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }

    /// Handle to the in-flight flag, for views that disable their controls.
    #[must_use]
    pub const fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn context(&self) -> PlanContext<'_> {
        PlanContext {
            templates: &self.templates,
            author: self.author.as_deref(),
            now: Utc::now(),
        }
    }

    fn acquire(&self, op: &'static str) -> Option<InFlightGuard> {
        let guard = self.in_flight.try_acquire();
        if guard.is_none() {
            debug!(op, "mutation already in flight; ignoring request");
        }
        guard
    }

    pub async fn create(&self, draft: ReportDraft) -> Result<Outcome, BoardError> {
        plan::require_text("title", &draft.title)?;
        let Some(_guard) = self.acquire("create") else {
            return Ok(Outcome::Skipped(SkipReason::Busy));
        };

        let effect = plan::plan_create(&draft, &self.context())?;
        self.execute(effect).await
    }

    pub async fn append_note(&self, id: &str, text: &str) -> Result<Outcome, BoardError> {
        plan::require_text("note text", text)?;
        let Some(_guard) = self.acquire("append_note") else {
            return Ok(Outcome::Skipped(SkipReason::Busy));
        };

        let effect = {
            let cache = self.cache.read();
            plan::plan_append_note(&cache, id, text, &self.context())?
        };
        self.execute(effect).await
    }

    pub async fn transition_to(&self, id: &str, target: Status) -> Result<Outcome, BoardError> {
        let Some(_guard) = self.acquire("transition") else {
            return Ok(Outcome::Skipped(SkipReason::Busy));
        };

        let planned = {
            let cache = self.cache.read();
            plan::plan_transition(&cache, id, target)?
        };
        match planned {
            Some(effect) => self.execute(effect).await,
            None => {
                debug!(id, status = %target, "report already in requested status");
                Ok(Outcome::Skipped(SkipReason::AlreadyInStatus(target)))
            }
        }
    }

    /// Move a report to in-progress.
    pub async fn start(&self, id: &str) -> Result<Outcome, BoardError> {
        self.transition_to(id, Status::InProgress).await
    }

    pub async fn mark_done(&self, id: &str) -> Result<Outcome, BoardError> {
        let Some(_guard) = self.acquire("mark_done") else {
            return Ok(Outcome::Skipped(SkipReason::Busy));
        };

        let planned = {
            let cache = self.cache.read();
            plan::plan_mark_done(&cache, id, &self.context())?
        };
        match planned {
            Some(effect) => self.execute(effect).await,
            None => {
                debug!(id, "report already done");
                Ok(Outcome::Skipped(SkipReason::AlreadyInStatus(Status::Done)))
            }
        }
    }

    /// Issue one planned effect. The caller holds the in-flight guard.
    async fn execute(&self, effect: Effect) -> Result<Outcome, BoardError> {
        match effect {
            Effect::Create(report) => match self.store.create(report.clone()).await {
                Ok(id) => {
                    info!(id = %id, title = %report.title, "report created");
                    Ok(Outcome::Created { id, report })
                }
                Err(err) => {
                    warn!(error = %err, "create report failed");
                    Err(BoardError::Transport(err.to_string()))
                }
            },
            Effect::Update { id, patch } => match self.store.update(&id, patch.clone()).await {
                Ok(()) => {
                    info!(
                        id = %id,
                        status = ?patch.status,
                        notes = patch.notes.as_ref().map(Vec::len),
                        "report updated"
                    );
                    Ok(Outcome::Updated { id, patch })
                }
                Err(err) => {
                    warn!(id = %id, error = %err, "update report failed");
                    Err(BoardError::from_store(&id, err))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Outcome, ReportDraft, SkipReason, WorkflowController};
    use crate::cache::ReportCache;
    use crate::error::BoardError;
    use crate::store::{MemoryStore, ReportStore, StoreError};
    use std::sync::Arc;

    #[tokio::test]
    async fn create_does_not_touch_the_cache() {
        let store = Arc::new(MemoryStore::new());
        let cache = ReportCache::shared();
        let controller = WorkflowController::new(Arc::clone(&store), Arc::clone(&cache));

        let outcome = controller.create(ReportDraft::new("Broken link")).await.unwrap();
        assert!(matches!(outcome, Outcome::Created { .. }));
        assert!(cache.read().is_empty());
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn create_failure_maps_to_transport_and_clears_flag() {
        let store = Arc::new(MemoryStore::new());
        let controller = WorkflowController::new(Arc::clone(&store), ReportCache::shared());

        store.fail_next(StoreError::Transport("network down".into()));
        let err = controller.create(ReportDraft::new("x")).await.unwrap_err();
        assert_eq!(err, BoardError::Transport("network down".into()));
        assert!(!controller.in_flight().is_set());
    }

    #[tokio::test]
    async fn held_flag_turns_calls_into_no_ops() {
        let store = Arc::new(MemoryStore::new());
        let controller = WorkflowController::new(Arc::clone(&store), ReportCache::shared());

        let _held = controller.in_flight().try_acquire().unwrap();
        let outcome = controller.create(ReportDraft::new("x")).await.unwrap();
        assert_eq!(outcome, Outcome::Skipped(SkipReason::Busy));
        assert!(outcome.is_skipped());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn works_through_a_trait_object() {
        let store: Arc<dyn ReportStore> = Arc::new(MemoryStore::new());
        let controller = WorkflowController::new(store, ReportCache::shared());
        let outcome = controller.create(ReportDraft::new("dyn")).await.unwrap();
        assert!(matches!(outcome, Outcome::Created { .. }));
    }
}
