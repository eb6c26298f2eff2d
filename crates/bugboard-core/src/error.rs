use std::fmt;

use crate::model::InvalidTransition;
use crate::store::StoreError;

/// Machine-readable error codes for front ends and log scrapers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    StoreUnavailable,
    ReportNotFound,
    InvalidStateTransition,
    ValidationFailed,
    TransportFailed,
    LockContention,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::StoreUnavailable => "E1004",
            Self::ReportNotFound => "E2001",
            Self::InvalidStateTransition => "E2002",
            Self::ValidationFailed => "E2005",
            Self::TransportFailed => "E5001",
            Self::LockContention => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::StoreUnavailable => "Report store unavailable",
            Self::ReportNotFound => "Report not found",
            Self::InvalidStateTransition => "Invalid status transition",
            Self::ValidationFailed => "Required field missing",
            Self::TransportFailed => "Store request failed",
            Self::LockContention => "Lock contention",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .bugboard/config.toml and retry."),
            Self::StoreUnavailable => {
                Some("Check the store path (--store, BUGBOARD_STORE, or [store].path).")
            }
            Self::ReportNotFound => Some("Run `bb list` to see the current report ids."),
            Self::InvalidStateTransition => {
                Some("Pick a status other than the report's current one.")
            }
            Self::ValidationFailed => Some("Provide a non-empty value and retry."),
            Self::TransportFailed => {
                Some("Retry once the store is reachable; `bb list` shows what landed.")
            }
            Self::LockContention => Some("Retry after the other `bb` process releases its lock."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors surfaced by workflow operations.
///
/// Validation and not-found errors are raised before any remote call, so
/// neither the cache nor the store has been touched when they are returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// A required text field was empty after trimming.
    #[error("{field} must not be empty")]
    Validation { field: &'static str },

    /// The target report is not in the current cache snapshot.
    #[error("report not found: {id}")]
    NotFound { id: String },

    /// The transition table does not allow the requested move.
    #[error("{0}")]
    InvalidTransition(#[from] InvalidTransition),

    /// The store rejected or failed to complete a request.
    #[error("store request failed: {0}")]
    Transport(String),
}

impl BoardError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::ValidationFailed,
            Self::NotFound { .. } => ErrorCode::ReportNotFound,
            Self::InvalidTransition(_) => ErrorCode::InvalidStateTransition,
            Self::Transport(_) => ErrorCode::TransportFailed,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    /// Map a store failure for the given report id.
    pub(crate) fn from_store(id: &str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound { id: id.to_string() },
            StoreError::Transport(msg) => Self::Transport(msg),
        }
    }
}
