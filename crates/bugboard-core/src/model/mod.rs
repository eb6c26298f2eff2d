//! Report and note data model.

pub mod note;
pub mod report;

pub use note::Note;
pub use report::{
    InvalidTransition, NewReport, ParseEnumError, Report, ReportPatch, Status, normalize_optional,
};
