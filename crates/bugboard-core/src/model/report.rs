use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::note::Note;
use crate::workflow::transition;

/// The three workflow states a report moves through.
///
/// Older collections stored the board's display labels verbatim, so those
/// are still accepted when reading documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    #[serde(alias = "Mới")]
    New,
    #[serde(alias = "Đang xử lý")]
    InProgress,
    #[serde(alias = "Hoàn thành")]
    Done,
}

impl Status {
    pub const ALL: [Self; 3] = [Self::New, Self::InProgress, Self::Done];

    const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    /// Human display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::InProgress => "In progress",
            Self::Done => "Done",
        }
    }

    /// Label written by the original board into stored documents.
    #[must_use]
    pub const fn legacy_label(self) -> &'static str {
        match self {
            Self::New => "Mới",
            Self::InProgress => "Đang xử lý",
            Self::Done => "Hoàn thành",
        }
    }

    /// Validate whether a transition from self to `target` is allowed.
    ///
    /// Requesting the current status is always rejected as a no-op; every
    /// other pair is looked up in [`transition::TRANSITIONS`].
    pub fn can_transition_to(&self, target: Self) -> Result<(), InvalidTransition> {
        if *self == target {
            return Err(InvalidTransition {
                from: *self,
                to: target,
                reason: "no-op transition is not allowed",
            });
        }

        if transition::is_allowed(*self, target) {
            Ok(())
        } else {
            Err(InvalidTransition {
                from: *self,
                to: target,
                reason: "transition not allowed by workflow table",
            })
        }
    }
}

/// Error returned when a status transition is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: Status,
    pub to: Status,
    pub reason: &'static str,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot move report from {} to {}: {}",
            self.from, self.to, self.reason
        )
    }
}

impl std::error::Error for InvalidTransition {}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "new" | "open" | "mới" => Ok(Self::New),
            "in_progress" | "in-progress" | "inprogress" | "in progress" | "doing"
            | "processing" | "đang xử lý" => Ok(Self::InProgress),
            "done" | "complete" | "completed" | "hoàn thành" => Ok(Self::Done),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

/// A report as mirrored from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Report {
    /// Attach a store-assigned id to freshly created fields.
    #[must_use]
    pub fn from_new(id: impl Into<String>, fields: NewReport) -> Self {
        Self {
            id: id.into(),
            title: fields.title,
            description: fields.description,
            reporter: fields.reporter,
            created_at: fields.created_at,
            status: fields.status,
            notes: fields.notes,
        }
    }

    /// Substring match over title, description and reporter.
    ///
    /// `needle` must already be lowercased.
    #[must_use]
    pub fn matches_search(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        let hit = |field: &str| field.to_lowercase().contains(needle);
        hit(&self.title)
            || self.description.as_deref().is_some_and(hit)
            || self.reporter.as_deref().is_some_and(hit)
    }

    /// Apply a partial update the way a document store does: present
    /// fields overwrite, absent fields are left alone.
    pub fn apply_patch(&mut self, patch: &ReportPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(notes) = &patch.notes {
            self.notes.clone_from(notes);
        }
    }
}

/// Fields sent to the store when creating a report. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: Status,
    pub notes: Vec<Note>,
}

/// Partial update for an existing report.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<Note>>,
}

impl ReportPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.notes.is_none()
    }
}

/// Trim a user-supplied optional field, mapping blank input to `None`.
#[must_use]
pub fn normalize_optional(input: Option<&str>) -> Option<String> {
    input
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}
