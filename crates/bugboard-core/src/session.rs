//! View-side context: the current query, the selected report, and the
//! derived data a front end renders.
//!
//! The session never mutates reports. It reads the shared cache and the
//! in-flight flag, so everything it returns reflects the latest snapshot.

use serde::Serialize;

use crate::cache::{SharedCache, StatusCounts};
use crate::filter::{self, FilterQuery, FilteredView, StatusSelector};
use crate::model::{Note, Report, Status};
use crate::workflow::InFlight;
use crate::workflow::transition;

/// Owned copy of the filtered list plus counters, safe to keep across awaits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardView {
    pub reports: Vec<Report>,
    pub matched: usize,
    pub total: usize,
    pub stats: StatusCounts,
    pub loaded: bool,
}

impl BoardView {
    /// `showing m/n reports`, as rendered under the search box.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("showing {}/{} reports", self.matched, self.total)
    }
}

/// A note with its display number. Notes keep stored order and count down
/// from the note count, so the first note carries `#n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberedNote {
    pub number: usize,
    #[serde(flatten)]
    pub note: Note,
}

/// Which actions the detail view should offer right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Affordances {
    pub add_note: bool,
    pub start: bool,
    pub mark_done: bool,
    /// Statuses the report may be moved to.
    pub transitions: Vec<Status>,
}

impl Affordances {
    #[must_use]
    pub fn for_report(report: &Report, busy: bool) -> Self {
        if busy {
            return Self {
                add_note: false,
                start: false,
                mark_done: false,
                transitions: Vec::new(),
            };
        }
        Self {
            add_note: true,
            start: report.status != Status::InProgress,
            mark_done: report.status != Status::Done,
            transitions: transition::targets(report.status).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportDetail {
    pub report: Report,
    pub notes: Vec<NumberedNote>,
    pub actions: Affordances,
}

impl ReportDetail {
    #[must_use]
    pub fn new(report: Report, busy: bool) -> Self {
        let count = report.notes.len();
        let notes = report
            .notes
            .iter()
            .enumerate()
            .map(|(index, note)| NumberedNote {
                number: count - index,
                note: note.clone(),
            })
            .collect();
        let actions = Affordances::for_report(&report, busy);
        Self {
            report,
            notes,
            actions,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BoardSession {
    cache: SharedCache,
    in_flight: InFlight,
    query: FilterQuery,
    selected: Option<String>,
}

impl BoardSession {
    #[must_use]
    pub fn new(cache: SharedCache, in_flight: InFlight) -> Self {
        Self {
            cache,
            in_flight,
            query: FilterQuery::default(),
            selected: None,
        }
    }

    #[must_use]
    pub const fn query(&self) -> &FilterQuery {
        &self.query
    }

    pub fn set_query(&mut self, query: FilterQuery) {
        self.query = query;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
    }

    pub fn set_status_filter(&mut self, status: StatusSelector) {
        self.query.status = status;
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_set()
    }

    /// Borrowing view over the cache. The read lock is held while `f` runs.
    pub fn with_view<R>(&self, f: impl FnOnce(&FilteredView<'_>, StatusCounts) -> R) -> R {
        let cache = self.cache.read();
        let view = filter::apply(cache.reports(), &self.query);
        f(&view, cache.stats())
    }

    #[must_use]
    pub fn view(&self) -> BoardView {
        let cache = self.cache.read();
        let view = filter::apply(cache.reports(), &self.query);
        BoardView {
            reports: view.reports.iter().map(|&r| r.clone()).collect(),
            matched: view.matched,
            total: view.total,
            stats: cache.stats(),
            loaded: cache.is_loaded(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> StatusCounts {
        self.cache.read().stats()
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<Report> {
        self.cache.read().find(id).cloned()
    }

    /// Select a report for the detail view. Unknown ids are ignored.
    pub fn select(&mut self, id: &str) -> bool {
        if self.cache.read().find(id).is_none() {
            return false;
        }
        self.selected = Some(id.to_string());
        true
    }

    pub fn close(&mut self) {
        self.selected = None;
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Detail of the selected report as of the latest snapshot.
    #[must_use]
    pub fn detail(&self) -> Option<ReportDetail> {
        let id = self.selected.as_deref()?;
        self.detail_of(id)
    }

    #[must_use]
    pub fn detail_of(&self, id: &str) -> Option<ReportDetail> {
        let report = self.find(id)?;
        Some(ReportDetail::new(report, self.is_busy()))
    }
}

#[cfg(test)]
mod tests {
    use super::{Affordances, BoardSession, ReportDetail};
    use crate::cache::ReportCache;
    use crate::filter::StatusSelector;
    use crate::model::{Note, Report, Status};
    use crate::workflow::InFlight;
    use chrono::{TimeZone, Utc};

    fn report(id: &str, title: &str, status: Status, notes: usize) -> Report {
        let at = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        Report {
            id: id.into(),
            title: title.into(),
            description: None,
            reporter: None,
            created_at: at,
            status,
            notes: (0..notes).map(|i| Note::new(format!("n{i}"), at, None)).collect(),
        }
    }

    fn session() -> (BoardSession, InFlight) {
        let cache = ReportCache::shared();
        cache.write().replace_all(vec![
            report("a", "Server crash", Status::New, 1),
            report("b", "Login broken", Status::InProgress, 2),
            report("c", "Crash on exit", Status::Done, 3),
        ]);
        let in_flight = InFlight::new();
        (BoardSession::new(cache, in_flight.clone()), in_flight)
    }

    #[test]
    fn view_applies_query_and_reports_counts() {
        let (mut session, _) = session();
        session.set_search("CRASH");
        let view = session.view();
        assert_eq!(view.matched, 2);
        assert_eq!(view.total, 3);
        assert_eq!(view.summary(), "showing 2/3 reports");
        assert_eq!(view.stats.total(), 3);

        session.set_status_filter(StatusSelector::Only(Status::Done));
        let ids = session.with_view(|view, _| {
            view.reports.iter().map(|r| r.id.clone()).collect::<Vec<_>>()
        });
        assert_eq!(ids, vec!["c"]);
    }

    #[test]
    fn select_ignores_unknown_ids() {
        let (mut session, _) = session();
        assert!(!session.select("zzz"));
        assert!(session.detail().is_none());

        assert!(session.select("b"));
        assert_eq!(session.selected_id(), Some("b"));
        session.close();
        assert!(session.selected_id().is_none());
    }

    #[test]
    fn notes_count_down_in_stored_order() {
        let detail = ReportDetail::new(report("x", "t", Status::New, 3), false);
        let numbers: Vec<_> = detail.notes.iter().map(|n| n.number).collect();
        assert_eq!(numbers, vec![3, 2, 1]);
        assert_eq!(detail.notes[0].note.text, "n0");
    }

    #[test]
    fn affordances_disable_current_status_and_busy_state() {
        let in_progress = report("x", "t", Status::InProgress, 1);
        let actions = Affordances::for_report(&in_progress, false);
        assert!(!actions.start);
        assert!(actions.mark_done);
        assert_eq!(actions.transitions, vec![Status::New, Status::Done]);

        let done = report("y", "t", Status::Done, 1);
        assert!(!Affordances::for_report(&done, false).mark_done);

        let busy = Affordances::for_report(&in_progress, true);
        assert!(!busy.add_note && !busy.start && !busy.mark_done);
        assert!(busy.transitions.is_empty());
    }

    #[test]
    fn detail_tracks_in_flight_flag() {
        let (mut session, in_flight) = session();
        session.select("a");
        let guard = in_flight.try_acquire().unwrap();
        assert!(!session.detail().unwrap().actions.add_note);
        drop(guard);
        assert!(session.detail().unwrap().actions.add_note);
    }
}
