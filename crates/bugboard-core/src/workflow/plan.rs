//! Pure effect planning.
//!
//! Each planner reads the cached state and its inputs and returns the
//! remote call to issue. Nothing here touches the store, the cache, or the
//! in-flight flag.
//!
//! Note sequences are rebuilt from the cached copy of the report. If the
//! cache is behind the store, a note added elsewhere in the meantime is
//! overwritten by the update (last writer wins).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::ReportCache;
use crate::error::BoardError;
use crate::model::{NewReport, Note, Report, ReportPatch, Status, normalize_optional};

/// Texts for notes the workflow writes on the user's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteTemplates {
    /// First note when a description was given; `{description}` is substituted.
    #[serde(default = "default_initial_with_description")]
    pub initial_with_description: String,
    /// First note when no description was given.
    #[serde(default = "default_initial_default")]
    pub initial_default: String,
    /// Note appended by mark-done.
    #[serde(default = "default_completion")]
    pub completion: String,
}

impl Default for NoteTemplates {
    fn default() -> Self {
        Self {
            initial_with_description: default_initial_with_description(),
            initial_default: default_initial_default(),
            completion: default_completion(),
        }
    }
}

impl NoteTemplates {
    #[must_use]
    pub fn initial(&self, description: Option<&str>) -> String {
        description.map_or_else(
            || self.initial_default.clone(),
            |text| self.initial_with_description.replace("{description}", text),
        )
    }
}

fn default_initial_with_description() -> String {
    "Initial description: {description}".to_string()
}

fn default_initial_default() -> String {
    "Request received.".to_string()
}

fn default_completion() -> String {
    "Marked complete.".to_string()
}

/// User input for a new report, before trimming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportDraft {
    pub title: String,
    pub description: Option<String>,
    pub reporter: Option<String>,
}

impl ReportDraft {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn reporter(mut self, reporter: impl Into<String>) -> Self {
        self.reporter = Some(reporter.into());
        self
    }
}

/// A remote call to issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Create(NewReport),
    Update { id: String, patch: ReportPatch },
}

/// Ambient inputs shared by every planner.
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    pub templates: &'a NoteTemplates,
    pub author: Option<&'a str>,
    pub now: DateTime<Utc>,
}

impl PlanContext<'_> {
    fn note(&self, text: impl Into<String>) -> Note {
        Note::new(text, self.now, self.author.map(ToString::to_string))
    }
}

/// Trim `value`, rejecting it if nothing is left.
pub fn require_text<'v>(field: &'static str, value: &'v str) -> Result<&'v str, BoardError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(BoardError::Validation { field })
    } else {
        Ok(trimmed)
    }
}

pub fn plan_create(draft: &ReportDraft, ctx: &PlanContext<'_>) -> Result<Effect, BoardError> {
    let title = require_text("title", &draft.title)?;
    let description = normalize_optional(draft.description.as_deref());
    let reporter = normalize_optional(draft.reporter.as_deref());
    let initial = ctx.note(ctx.templates.initial(description.as_deref()));

    Ok(Effect::Create(NewReport {
        title: title.to_string(),
        description,
        reporter,
        created_at: ctx.now,
        status: Status::New,
        notes: vec![initial],
    }))
}

pub fn plan_append_note(
    cache: &ReportCache,
    id: &str,
    text: &str,
    ctx: &PlanContext<'_>,
) -> Result<Effect, BoardError> {
    let text = require_text("note text", text)?;
    let report = lookup(cache, id)?;
    Ok(Effect::Update {
        id: report.id.clone(),
        patch: ReportPatch {
            status: None,
            notes: Some(appended(report, ctx.note(text))),
        },
    })
}

/// `Ok(None)` when the report is already in `target`.
pub fn plan_transition(
    cache: &ReportCache,
    id: &str,
    target: Status,
) -> Result<Option<Effect>, BoardError> {
    let report = lookup(cache, id)?;
    if report.status == target {
        return Ok(None);
    }
    report.status.can_transition_to(target)?;
    Ok(Some(Effect::Update {
        id: report.id.clone(),
        patch: ReportPatch {
            status: Some(target),
            notes: None,
        },
    }))
}

/// Status change to done plus the completion note, as one update.
///
/// `Ok(None)` when the report is already done.
pub fn plan_mark_done(
    cache: &ReportCache,
    id: &str,
    ctx: &PlanContext<'_>,
) -> Result<Option<Effect>, BoardError> {
    let report = lookup(cache, id)?;
    if report.status == Status::Done {
        return Ok(None);
    }
    report.status.can_transition_to(Status::Done)?;
    let note = ctx.note(ctx.templates.completion.clone());
    Ok(Some(Effect::Update {
        id: report.id.clone(),
        patch: ReportPatch {
            status: Some(Status::Done),
            notes: Some(appended(report, note)),
        },
    }))
}

fn lookup<'c>(cache: &'c ReportCache, id: &str) -> Result<&'c Report, BoardError> {
    cache
        .find(id)
        .ok_or_else(|| BoardError::NotFound { id: id.to_string() })
}

fn appended(report: &Report, note: Note) -> Vec<Note> {
    let mut notes = Vec::with_capacity(report.notes.len() + 1);
    notes.extend_from_slice(&report.notes);
    notes.push(note);
    notes
}
