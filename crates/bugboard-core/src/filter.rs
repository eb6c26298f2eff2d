//! Search and status filtering over the cached report list.

use serde::Serialize;
use std::{fmt, str::FromStr};

use crate::model::{ParseEnumError, Report, Status, report::normalize};

/// Sentinel the original board used for "every status" in its selector.
pub const LEGACY_ALL_SENTINEL: &str = "Tất cả";

/// Which statuses the list should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusSelector {
    #[default]
    All,
    Only(Status),
}

impl StatusSelector {
    #[must_use]
    pub fn matches(self, status: Status) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

impl fmt::Display for StatusSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(status) => write!(f, "{status}"),
        }
    }
}

impl FromStr for StatusSelector {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        if normalized.is_empty()
            || normalized == "all"
            || normalized == "*"
            || normalized == normalize(LEGACY_ALL_SENTINEL)
        {
            return Ok(Self::All);
        }
        Status::from_str(s)
            .map(Self::Only)
            .map_err(|_| ParseEnumError {
                expected: "status filter",
                got: s.to_string(),
            })
    }
}

/// Current search box text plus status selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    pub search: String,
    pub status: StatusSelector,
}

impl FilterQuery {
    #[must_use]
    pub fn new(search: impl Into<String>, status: StatusSelector) -> Self {
        Self {
            search: search.into(),
            status,
        }
    }
}

/// Filtered subset of the cache, in cache order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilteredView<'a> {
    pub reports: Vec<&'a Report>,
    pub matched: usize,
    pub total: usize,
}

impl FilteredView<'_> {
    #[must_use]
    pub const fn counts(&self) -> (usize, usize) {
        (self.matched, self.total)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

impl fmt::Display for FilteredView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "showing {}/{} reports", self.matched, self.total)
    }
}

/// Filter `reports` by `query`. Pure; the input order is kept.
#[must_use]
pub fn apply<'a>(reports: &'a [Report], query: &FilterQuery) -> FilteredView<'a> {
    let needle = query.search.trim().to_lowercase();
    let matching: Vec<&Report> = reports
        .iter()
        .filter(|report| query.status.matches(report.status) && report.matches_search(&needle))
        .collect();

    FilteredView {
        matched: matching.len(),
        total: reports.len(),
        reports: matching,
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterQuery, LEGACY_ALL_SENTINEL, StatusSelector, apply};
    use crate::model::{Report, Status};
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn report(id: &str, title: &str, status: Status) -> Report {
        Report {
            id: id.into(),
            title: title.into(),
            description: None,
            reporter: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            status,
            notes: vec![],
        }
    }

    fn fixture() -> Vec<Report> {
        vec![
            report("1", "Server Crash", Status::New),
            Report {
                description: Some("Button is misaligned".into()),
                ..report("2", "Login page", Status::InProgress)
            },
            Report {
                reporter: Some("Crash Test Dummy".into()),
                ..report("3", "Typo in footer", Status::Done)
            },
            report("4", "Slow search", Status::New),
        ]
    }

    fn ids<'a>(view: &super::FilteredView<'a>) -> Vec<&'a str> {
        view.reports.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn empty_search_and_all_returns_everything_in_order() {
        let reports = fixture();
        let all = StatusSelector::from_str(LEGACY_ALL_SENTINEL).unwrap();
        let view = apply(&reports, &FilterQuery::new("", all));
        assert_eq!(ids(&view), vec!["1", "2", "3", "4"]);
        assert_eq!(view.counts(), (4, 4));
    }

    #[test]
    fn search_is_case_insensitive_and_trimmed() {
        let reports = fixture();
        let view = apply(&reports, &FilterQuery::new("  crash ", StatusSelector::All));
        assert_eq!(ids(&view), vec!["1", "3"]);
        assert_eq!(view.to_string(), "showing 2/4 reports");
    }

    #[test]
    fn search_reaches_description() {
        let reports = fixture();
        let view = apply(&reports, &FilterQuery::new("MISALIGNED", StatusSelector::All));
        assert_eq!(ids(&view), vec!["2"]);
    }

    #[test]
    fn status_and_search_combine() {
        let reports = fixture();
        let view = apply(
            &reports,
            &FilterQuery::new("crash", StatusSelector::Only(Status::Done)),
        );
        assert_eq!(ids(&view), vec!["3"]);

        let view = apply(
            &reports,
            &FilterQuery::new("", StatusSelector::Only(Status::New)),
        );
        assert_eq!(ids(&view), vec!["1", "4"]);
    }

    #[test]
    fn no_match_yields_empty_view_with_total() {
        let reports = fixture();
        let view = apply(&reports, &FilterQuery::new("nothing here", StatusSelector::All));
        assert!(view.is_empty());
        assert_eq!(view.counts(), (0, 4));
    }

    #[test]
    fn selector_parses_sentinels_and_statuses() {
        assert_eq!(StatusSelector::from_str("all").unwrap(), StatusSelector::All);
        assert_eq!(StatusSelector::from_str("*").unwrap(), StatusSelector::All);
        assert_eq!(
            StatusSelector::from_str("Hoàn thành").unwrap(),
            StatusSelector::Only(Status::Done)
        );
        assert_eq!(
            StatusSelector::from_str("in_progress").unwrap(),
            StatusSelector::Only(Status::InProgress)
        );
        assert!(StatusSelector::from_str("closed").is_err());
        assert_eq!(StatusSelector::Only(Status::New).to_string(), "new");
    }
}
